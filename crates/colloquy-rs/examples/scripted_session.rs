//! Offline session example — a full game against a scripted gateway.
//!
//! No API key, no network: the "model" replays canned utterances, which is
//! exactly how the test suite drives the session. Useful for seeing the
//! turn order, the arbiter exchange, and the report shape.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example scripted_session
//! ```

use colloquy_rs::prelude::*;
use std::sync::Mutex;

struct ScriptedGateway {
    replies: Mutex<Vec<String>>,
}

impl Gateway for ScriptedGateway {
    fn chat(&self, _body: ChatRequest) -> ChatFuture<'_> {
        Box::pin(async move {
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "I have nothing to add.".to_string());
            Ok(ChatCompletion {
                content: Some(text),
                finish_reason: Some("stop".into()),
                usage: Some(UsageInfo {
                    prompt_tokens: Some(150),
                    completion_tokens: Some(30),
                    total_tokens: Some(180),
                }),
            })
        })
    }
}

#[tokio::main]
async fn main() {
    // Replies pop from the back: listed here in call order, then reversed.
    let mut replies: Vec<String> = [
        "The taste itself must be the trigger — he has had 'turtle soup' before.",
        "Wait — what if the soup he had before was not turtle at all?",
        "[ASK_ARBITER] is the real story that someone once fed him human flesh as turtle soup?",
        "That is completely correct — you solved it.",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    replies.reverse();
    let gateway = ScriptedGateway {
        replies: Mutex::new(replies),
    };

    let puzzle = builtin_puzzles().remove(0);
    let config = SessionConfig::new("scripted").with_max_rounds(6);

    let report = Session::new(&gateway, puzzle, default_cast(), config)
        .with_event_handler(&LoggingHandler)
        .run()
        .await;

    for entry in report.transcript.entries() {
        println!("[{}] {}", entry.speaker, entry.text);
    }
    println!("\noutcome: {:?}", report.outcome);
    println!("solution: {}", report.solution);
    println!("usage: {}", report.usage);
}
