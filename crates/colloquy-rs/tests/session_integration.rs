//! End-to-end session scenarios against a scripted gateway.

use colloquy_rs::game::config::SessionConfig;
use colloquy_rs::game::events::{FnEventHandler, SessionEvent};
use colloquy_rs::game::puzzle::{Puzzle, RoleSpec};
use colloquy_rs::game::session::{Outcome, Session};
use colloquy_rs::{ChatCompletion, ChatFuture, ChatRequest, Gateway, UsageInfo};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Scripted gateway: pops one canned completion per call, in call order.
/// Participant and arbiter calls share the same queue, exactly as they
/// share the real endpoint.
struct ScriptedGateway {
    replies: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    fn new(replies: &[&str]) -> Self {
        let mut replies: Vec<String> = replies.iter().map(|s| s.to_string()).collect();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
        }
    }
}

impl Gateway for ScriptedGateway {
    fn chat(&self, _body: ChatRequest) -> ChatFuture<'_> {
        Box::pin(async move {
            let text = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| "nothing left to say".to_string());
            Ok(ChatCompletion {
                content: Some(text),
                finish_reason: Some("stop".into()),
                usage: Some(UsageInfo {
                    prompt_tokens: Some(200),
                    completion_tokens: Some(40),
                    total_tokens: Some(240),
                }),
            })
        })
    }
}

fn puzzle() -> Puzzle {
    Puzzle::new(
        "Turtle Soup",
        "A man orders turtle soup, takes one sip, and kills himself. Why?",
        "His companion once fed him his own flesh as turtle soup.",
    )
}

fn cast() -> Vec<RoleSpec> {
    vec![
        RoleSpec::new("A", "player a"),
        RoleSpec::new("B", "player b"),
        RoleSpec::new("C", "player c"),
    ]
}

#[tokio::test]
async fn player_b_solves_in_round_five() {
    // Rotation: A(1) B(2) C(3) A(4) B(5). B's second utterance — round 5 —
    // carries the sentinel, and the arbiter confirms.
    let gateway = ScriptedGateway::new(&[
        "the soup must mean something to him",    // A, round 1
        "what if he had tasted it before?",       // B, round 2
        "we should pin down where he tasted it",  // C, round 3
        "he reacted to the taste, not the dish",  // A, round 4
        "[ASK_ARBITER] is it that his companion fed him human flesh as turtle soup?", // B, round 5
        "That is completely correct — you solved it.", // arbiter
    ]);

    let arbiter_exchanges = AtomicU32::new(0);
    let handler = FnEventHandler::new(|event| {
        if let SessionEvent::ArbiterVerdict { .. } = event {
            arbiter_exchanges.fetch_add(1, Ordering::SeqCst);
        }
    });

    let config = SessionConfig::new("test-model").with_max_rounds(6);
    let report = Session::new(&gateway, puzzle(), cast(), config)
        .with_event_handler(&handler)
        .run()
        .await;

    assert_eq!(report.outcome, Outcome::Solved { round: 5 });
    assert_eq!(report.rounds_used, 5);
    assert_eq!(arbiter_exchanges.load(Ordering::SeqCst), 1);

    // Seed + 5 player utterances + 1 arbiter verdict.
    assert_eq!(report.transcript.len(), 7);
    let host_entries = report
        .transcript
        .entries()
        .iter()
        .skip(1) // the seeded puzzle statement is also tagged Host
        .filter(|u| u.speaker == "Host")
        .count();
    assert_eq!(host_entries, 1);

    // 5 player calls + 1 arbiter call, 240 total tokens each.
    assert_eq!(report.usage.call_count, 6);
    assert_eq!(report.usage.total_tokens, 6 * 240);
}

#[tokio::test]
async fn unanswered_table_times_out_and_reveals_the_solution() {
    let gateway = ScriptedGateway::new(&[]);
    let config = SessionConfig::new("test-model").with_max_rounds(4);
    let report = Session::new(&gateway, puzzle(), cast(), config).run().await;

    assert_eq!(report.outcome, Outcome::TimedOut);
    assert_eq!(report.rounds_used, 4);
    assert!(report.solution.contains("his own flesh"));
    assert_eq!(report.transcript.len(), 5);
    assert_eq!(report.usage.call_count, 4);
}

#[tokio::test]
async fn custom_sentinel_and_phrases_are_honored() {
    let gateway = ScriptedGateway::new(&[
        "<<Q>> did the companion die at sea?",
        "Affirmative — case closed.",
    ]);
    let config = SessionConfig::new("test-model")
        .with_max_rounds(3)
        .with_sentinel("<<Q>>")
        .with_confirmation_phrases(vec!["case closed".into()]);
    let report = Session::new(&gateway, puzzle(), cast(), config).run().await;

    assert_eq!(report.outcome, Outcome::Solved { round: 1 });
}
