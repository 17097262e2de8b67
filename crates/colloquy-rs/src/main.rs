//! Run a multi-agent deduction game in the terminal.
//!
//! Reads the API key from the `COLLOQUY_API_KEY` environment variable and
//! the endpoint from `COLLOQUY_BASE_URL` (or `--base-url`). Any
//! OpenAI-compatible chat completions endpoint works.
//!
//! # Examples
//!
//! ```sh
//! # List the built-in puzzles
//! colloquy --list-puzzles
//!
//! # Run puzzle 0 with defaults (15 rounds, window of 15)
//! colloquy
//!
//! # A shorter game against a specific endpoint
//! colloquy --puzzle 2 --max-rounds 9 \
//!   --base-url https://api.deepseek.com --model deepseek-chat
//! ```
//!
//! Ctrl-C interrupts the session cleanly: the in-flight model call
//! finishes, then the solution and the usage summary are still printed.

use clap::Parser;
use colloquy_rs::ChatClient;
use colloquy_rs::game::config::SessionConfig;
use colloquy_rs::game::events::{CompositeEventHandler, EventHandler, LoggingHandler, SessionEvent};
use colloquy_rs::game::puzzle::{builtin_puzzles, default_cast};
use colloquy_rs::game::session::{Outcome, Session};
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run a scripted multi-agent deduction game against a chat endpoint.
#[derive(Parser)]
#[command(name = "colloquy")]
struct Cli {
    /// Index of the built-in puzzle to play
    #[arg(long, default_value_t = 0)]
    puzzle: usize,

    /// List the built-in puzzles and exit
    #[arg(long)]
    list_puzzles: bool,

    /// Model identifier sent with every call
    #[arg(long, default_value = colloquy_rs::DEFAULT_MODEL)]
    model: String,

    /// Chat endpoint base URL (falls back to COLLOQUY_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum completed turns before the game times out
    #[arg(long, default_value_t = 15)]
    max_rounds: u32,

    /// Transcript entries shown to each speaker
    #[arg(long, default_value_t = 15)]
    window: usize,

    /// Sampling temperature for player turns
    #[arg(long, default_value_t = 0.8)]
    participant_temperature: f32,

    /// Sampling temperature for arbiter verdicts
    #[arg(long, default_value_t = 0.3)]
    arbiter_temperature: f32,

    /// Output-token budget for player turns
    #[arg(long, default_value_t = 1024)]
    participant_max_tokens: u32,

    /// Output-token budget for arbiter verdicts
    #[arg(long, default_value_t = 256)]
    arbiter_max_tokens: u32,

    /// Retries for transient gateway errors
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

const RULE: &str = "──────────────────────────────────────────────────────────────────────";

/// Renders the game to stdout as it unfolds.
struct PrinterHandler;

impl EventHandler for PrinterHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::RoundStart {
                round,
                max_rounds,
                speaker,
            } => {
                println!("\n{RULE}");
                println!("round {round}/{max_rounds} — {speaker} is thinking...");
            }
            SessionEvent::Utterance { speaker, text } => {
                println!("{speaker}: {text}");
            }
            SessionEvent::QuestionPosed { speaker, question } => {
                println!("  ({speaker} puts a question to the host: {question})");
            }
            SessionEvent::ArbiterVerdict { text } => {
                println!("Host: {text}");
            }
            SessionEvent::CallFailed { speaker, .. } => {
                println!("  (the model call for {speaker} failed; moving on)");
            }
            SessionEvent::EmptyResponse { speaker, .. } => {
                println!("  (the model returned nothing for {speaker}; moving on)");
            }
            SessionEvent::Solved { round } => {
                println!("\n{RULE}");
                println!("The players cracked it in round {round}!");
            }
            SessionEvent::RoundLimitReached { max_rounds } => {
                println!("\n{RULE}");
                println!("Round limit reached ({max_rounds}) — the puzzle stands unsolved.");
            }
            SessionEvent::Interrupted => {
                println!("\n{RULE}");
                println!("Game interrupted.");
            }
            SessionEvent::Failed { reason } => {
                println!("\n{RULE}");
                println!("Game failed: {reason}");
            }
            SessionEvent::TokenUsage { .. } => {}
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let puzzles = builtin_puzzles();

    if cli.list_puzzles {
        for (index, puzzle) in puzzles.iter().enumerate() {
            println!("{index}. {}", puzzle.title);
        }
        return Ok(());
    }

    let puzzle = puzzles
        .get(cli.puzzle)
        .cloned()
        .ok_or_else(|| format!("no puzzle {} (0..{})", cli.puzzle, puzzles.len() - 1))?;

    let api_key =
        std::env::var("COLLOQUY_API_KEY").map_err(|_| "COLLOQUY_API_KEY not set".to_string())?;
    let base_url = match cli.base_url {
        Some(url) => url,
        None => std::env::var("COLLOQUY_BASE_URL")
            .map_err(|_| "set COLLOQUY_BASE_URL or pass --base-url".to_string())?,
    };

    let client = ChatClient::new(&base_url, api_key)?;

    let config = SessionConfig::new(&cli.model)
        .with_max_rounds(cli.max_rounds)
        .with_context_window(cli.window)
        .with_temperatures(cli.participant_temperature, cli.arbiter_temperature)
        .with_token_budgets(cli.participant_max_tokens, cli.arbiter_max_tokens)
        .with_retries(cli.retries);

    println!("{RULE}");
    println!("colloquy — {}", puzzle.title);
    println!(
        "model {} · up to {} rounds · started {}",
        cli.model,
        cli.max_rounds,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    println!("{RULE}");
    println!("\nThe puzzle: {}", puzzle.story);

    // Ctrl-C flips the stop flag; the session honors it between rounds.
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    let handler = CompositeEventHandler::new()
        .with(PrinterHandler)
        .with(LoggingHandler);

    let report = Session::new(&client, puzzle, default_cast(), config)
        .with_event_handler(&handler)
        .with_stop_signal({
            let stop = stop.clone();
            move || stop.load(Ordering::SeqCst)
        })
        .run()
        .await;

    // Every outcome reveals the solution and the usage figures.
    println!("\nThe solution: {}", report.solution);
    println!("\n{RULE}");
    println!("usage: {}", report.usage);
    println!("{RULE}");

    match report.outcome {
        Outcome::Failed { reason } => Err(reason),
        _ => Ok(()),
    }
}
