//! The session driver: a bounded multi-agent conversation run.
//!
//! [`Session::run`] owns the shared transcript, the round counter, the
//! usage tracker, and the terminal outcome. It drives the
//! [`TurnScheduler`](super::scheduler::TurnScheduler) through participant
//! turns and arbiter exchanges strictly sequentially, one gateway call
//! outstanding at a time, and always returns a [`SessionReport`] that
//! carries the solution and the usage summary, whatever the outcome.

use crate::Gateway;
use crate::api::usage::{UsageSummary, UsageTracker};
use crate::game::config::SessionConfig;
use crate::game::events::{EventHandler, NoopHandler, SessionEvent};
use crate::game::participant::{Arbiter, CallSettings, Participant};
use crate::game::puzzle::{ARBITER_NAME, Puzzle, RoleSpec};
use crate::game::scheduler::{TurnScheduler, TurnState};
use crate::game::transcript::Transcript;
use tracing::info;

// ── Outcome and report ─────────────────────────────────────────────

/// How a session ended. Exactly one of these is reached on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// An arbiter reply matched a confirmation phrase.
    Solved { round: u32 },
    /// The round limit was reached without a win.
    TimedOut,
    /// The stop signal was observed between rounds.
    Interrupted,
    /// An orchestration-level error (bad config, empty cast).
    Failed { reason: String },
}

/// The terminal value of a run.
///
/// Every path, including interruption and failure, reveals the solution
/// and reports usage, so callers never need to reconstruct either from
/// control flow.
#[derive(Debug)]
pub struct SessionReport {
    pub outcome: Outcome,
    /// Completed turns (0 when the run failed before the first turn).
    pub rounds_used: u32,
    pub transcript: Transcript,
    pub solution: String,
    pub usage: UsageSummary,
}

// ── Session ────────────────────────────────────────────────────────

/// A single bounded game run.
///
/// Borrows the gateway and event handler; bind them to `let` bindings
/// before building the session so they outlive `.run()`:
///
/// ```ignore
/// let client = ChatClient::new(base_url, api_key)?;
/// let handler = LoggingHandler;
/// let report = Session::new(&client, puzzle, default_cast(), config)
///     .with_event_handler(&handler)
///     .run()
///     .await;
/// ```
pub struct Session<'a> {
    gateway: &'a dyn Gateway,
    puzzle: Puzzle,
    cast: Vec<RoleSpec>,
    config: SessionConfig,
    event_handler: &'a dyn EventHandler,
    /// Checked between rounds; `true` means stop. In-flight calls finish
    /// first; cancellation is honored at the next round boundary.
    stop_signal: Option<Box<dyn Fn() -> bool + Send + Sync + 'a>>,
}

impl<'a> Session<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        puzzle: Puzzle,
        cast: Vec<RoleSpec>,
        config: SessionConfig,
    ) -> Self {
        Self {
            gateway,
            puzzle,
            cast,
            config,
            event_handler: &NoopHandler,
            stop_signal: None,
        }
    }

    /// Attach an event handler.
    pub fn with_event_handler(mut self, handler: &'a dyn EventHandler) -> Self {
        self.event_handler = handler;
        self
    }

    /// Attach a stop signal, checked before each round.
    pub fn with_stop_signal(mut self, signal: impl Fn() -> bool + Send + Sync + 'a) -> Self {
        self.stop_signal = Some(Box::new(signal));
        self
    }

    /// Run the conversation loop to a terminal outcome.
    pub async fn run(self) -> SessionReport {
        let mut transcript = Transcript::seeded(ARBITER_NAME, &self.puzzle.story);
        let mut usage = UsageTracker::new();

        if let Err(reason) = self.config.validate() {
            return self.failed_report(reason, transcript, &usage);
        }
        let mut scheduler = match TurnScheduler::new(self.cast.len(), self.config.max_rounds) {
            Ok(scheduler) => scheduler,
            Err(reason) => return self.failed_report(reason, transcript, &usage),
        };

        info!(
            "session started: puzzle=\"{}\", players={}, max_rounds={}",
            self.puzzle.title,
            self.cast.len(),
            self.config.max_rounds,
        );

        let participant_settings = CallSettings {
            model: self.config.model.clone(),
            temperature: self.config.participant_temperature,
            max_tokens: self.config.participant_max_tokens,
        };
        let arbiter_settings = CallSettings {
            model: self.config.model.clone(),
            temperature: self.config.arbiter_temperature,
            max_tokens: self.config.arbiter_max_tokens,
        };

        let mut participants: Vec<Participant> = self
            .cast
            .iter()
            .map(|role| Participant::new(role, participant_settings.clone()))
            .collect();
        let mut arbiter = Arbiter::new(&self.puzzle, arbiter_settings);

        let mut completed_rounds = 0;

        let outcome = loop {
            if let Some(ref stop) = self.stop_signal
                && stop()
            {
                scheduler.interrupt();
                self.event_handler.on_event(&SessionEvent::Interrupted);
                break Outcome::Interrupted;
            }

            let round = scheduler.round();
            let index = scheduler.current_index();
            let speaker = participants[index].name().to_string();
            self.event_handler.on_event(&SessionEvent::RoundStart {
                round,
                max_rounds: self.config.max_rounds,
                speaker: &speaker,
            });

            let context = transcript.window(self.config.context_window);
            let text = participants[index]
                .act(
                    self.gateway,
                    &mut usage,
                    &self.config.retry,
                    self.event_handler,
                    &context,
                    &self.config.sentinel,
                )
                .await;
            transcript.push(&speaker, &text);
            self.event_handler.on_event(&SessionEvent::Utterance {
                speaker: &speaker,
                text: &text,
            });

            if let Some(question) = scheduler.observe_utterance(&text, &self.config.sentinel) {
                self.event_handler.on_event(&SessionEvent::QuestionPosed {
                    speaker: &speaker,
                    question: &question,
                });
                let reply = arbiter
                    .judge(
                        self.gateway,
                        &mut usage,
                        &self.config.retry,
                        self.event_handler,
                        &speaker,
                        &question,
                    )
                    .await;
                transcript.push(arbiter.name(), &reply);
                self.event_handler
                    .on_event(&SessionEvent::ArbiterVerdict { text: &reply });

                if scheduler.observe_verdict(&reply, &self.config.confirmation_phrases) {
                    completed_rounds = round;
                    self.event_handler.on_event(&SessionEvent::Solved { round });
                    break Outcome::Solved { round };
                }
            }

            completed_rounds = round;
            scheduler.complete_turn();
            if scheduler.state() == TurnState::TimedOut {
                self.event_handler.on_event(&SessionEvent::RoundLimitReached {
                    max_rounds: self.config.max_rounds,
                });
                break Outcome::TimedOut;
            }
        };

        let usage_summary = usage.summary(&self.config.cost_rates);
        info!(
            "session finished: outcome={:?}, rounds={}, {}",
            outcome, completed_rounds, usage_summary,
        );

        SessionReport {
            outcome,
            rounds_used: completed_rounds,
            transcript,
            solution: self.puzzle.solution.clone(),
            usage: usage_summary,
        }
    }

    /// Terminal report for an orchestration failure. The solution and the
    /// (possibly all-zero) usage summary are still included.
    fn failed_report(
        &self,
        reason: String,
        transcript: Transcript,
        usage: &UsageTracker,
    ) -> SessionReport {
        self.event_handler
            .on_event(&SessionEvent::Failed { reason: &reason });
        SessionReport {
            outcome: Outcome::Failed { reason },
            rounds_used: 0,
            transcript,
            solution: self.puzzle.solution.clone(),
            usage: usage.summary(&self.config.cost_rates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::participant::FAILED_CALL_PLACEHOLDER;
    use crate::{ChatCompletion, ChatFuture, ChatRequest, UsageInfo};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Scripted gateway: pops one canned result per call, in order.
    struct Scripted {
        results: Mutex<Vec<Result<ChatCompletion, String>>>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<ChatCompletion, String>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
            }
        }
    }

    impl Gateway for Scripted {
        fn chat(&self, _body: ChatRequest) -> ChatFuture<'_> {
            Box::pin(async move {
                self.results
                    .lock()
                    .unwrap()
                    .pop()
                    .unwrap_or_else(|| Ok(reply_completion("I keep thinking.")))
            })
        }
    }

    fn reply_completion(text: &str) -> ChatCompletion {
        ChatCompletion {
            content: Some(text.into()),
            finish_reason: Some("stop".into()),
            usage: Some(UsageInfo {
                prompt_tokens: Some(100),
                completion_tokens: Some(20),
                total_tokens: Some(120),
            }),
        }
    }

    fn reply(text: &str) -> Result<ChatCompletion, String> {
        Ok(reply_completion(text))
    }

    fn puzzle() -> Puzzle {
        Puzzle::new("Test", "a strange story", "the hidden truth")
    }

    fn cast() -> Vec<RoleSpec> {
        vec![
            RoleSpec::new("A", "player a"),
            RoleSpec::new("B", "player b"),
            RoleSpec::new("C", "player c"),
        ]
    }

    fn config() -> SessionConfig {
        SessionConfig::new("test-model").with_max_rounds(6)
    }

    fn speakers(report: &SessionReport) -> Vec<&str> {
        report
            .transcript
            .entries()
            .iter()
            .map(|u| u.speaker.as_str())
            .collect()
    }

    #[tokio::test]
    async fn no_questions_means_round_robin_to_timeout() {
        let gateway = Scripted::new((0..6).map(|i| reply(&format!("thought {i}"))).collect());
        let report = Session::new(&gateway, puzzle(), cast(), config()).run().await;

        assert_eq!(report.outcome, Outcome::TimedOut);
        assert_eq!(report.rounds_used, 6);
        assert_eq!(
            speakers(&report),
            ["Host", "A", "B", "C", "A", "B", "C"],
            "seed entry plus strict rotation"
        );
        assert_eq!(report.solution, "the hidden truth");
        assert_eq!(report.usage.call_count, 6);
        assert_eq!(report.usage.total_tokens, 6 * 120);
    }

    #[tokio::test]
    async fn sentinel_triggers_exactly_one_arbiter_exchange() {
        let gateway = Scripted::new(vec![
            reply("discussing"),
            reply("[ASK_ARBITER] was it at sea?"),
            reply("Yes."), // arbiter
            reply("more discussion"),
            reply("closing thought"),
            reply("last word"),
            reply("final round"),
        ]);
        let report = Session::new(&gateway, puzzle(), cast(), config()).run().await;

        assert_eq!(report.outcome, Outcome::TimedOut);
        // Rotation unaffected by the exchange: B asked in round 2, C still
        // speaks round 3.
        assert_eq!(
            speakers(&report),
            ["Host", "A", "B", "Host", "C", "A", "B", "C"]
        );
        assert_eq!(report.usage.call_count, 7);
    }

    #[tokio::test]
    async fn confirmation_reply_ends_the_session_solved() {
        let gateway = Scripted::new(vec![
            reply("[ASK_ARBITER] is the full story that he ate his friend?"),
            reply("That is completely correct — you solved it."),
        ]);
        let report = Session::new(&gateway, puzzle(), cast(), config()).run().await;

        assert_eq!(report.outcome, Outcome::Solved { round: 1 });
        assert_eq!(report.rounds_used, 1);
        assert_eq!(report.usage.call_count, 2);
        assert_eq!(report.transcript.len(), 3); // seed + question + verdict
    }

    #[tokio::test]
    async fn failed_call_becomes_placeholder_and_run_continues() {
        let mut script = vec![Err("chat API HTTP 500: boom".to_string())];
        script.extend((0..5).map(|i| reply(&format!("t{i}"))));
        let gateway = Scripted::new(script);
        let report = Session::new(&gateway, puzzle(), cast(), config()).run().await;

        assert_eq!(report.outcome, Outcome::TimedOut);
        assert_eq!(report.transcript.entries()[1].text, FAILED_CALL_PLACEHOLDER);
        assert_eq!(report.transcript.len(), 7);
        // Five successful calls recorded; the failed one contributes nothing.
        assert_eq!(report.usage.call_count, 5);
    }

    #[tokio::test]
    async fn stop_signal_interrupts_between_rounds() {
        let gateway = Scripted::new(vec![reply("first thought")]);
        let stop_after_first = AtomicBool::new(false);
        let report = Session::new(&gateway, puzzle(), cast(), config())
            .with_stop_signal(|| stop_after_first.swap(true, Ordering::SeqCst))
            .run()
            .await;

        // The signal read false before round 1 and true before round 2.
        assert_eq!(report.outcome, Outcome::Interrupted);
        assert_eq!(report.rounds_used, 1);
        assert_eq!(report.solution, "the hidden truth");
        assert_eq!(report.usage.call_count, 1);
    }

    #[tokio::test]
    async fn empty_cast_fails_with_summary_and_solution() {
        let gateway = Scripted::new(vec![]);
        let report = Session::new(&gateway, puzzle(), Vec::new(), config())
            .run()
            .await;

        match &report.outcome {
            Outcome::Failed { reason } => assert!(reason.contains("participant list")),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(report.rounds_used, 0);
        assert_eq!(report.usage.call_count, 0);
        assert_eq!(report.solution, "the hidden truth");
    }

    #[tokio::test]
    async fn invalid_config_fails_before_any_call() {
        let gateway = Scripted::new(vec![]);
        let report = Session::new(&gateway, puzzle(), cast(), config().with_context_window(0))
            .run()
            .await;

        assert!(matches!(report.outcome, Outcome::Failed { .. }));
        assert_eq!(report.usage.call_count, 0);
        // Transcript still carries the seeded puzzle statement.
        assert_eq!(report.transcript.len(), 1);
    }

    #[tokio::test]
    async fn single_participant_cast_runs() {
        let gateway = Scripted::new((0..3).map(|i| reply(&format!("solo {i}"))).collect());
        let config = SessionConfig::new("test-model").with_max_rounds(3);
        let report = Session::new(
            &gateway,
            puzzle(),
            vec![RoleSpec::new("Solo", "alone")],
            config,
        )
        .run()
        .await;

        assert_eq!(report.outcome, Outcome::TimedOut);
        assert_eq!(speakers(&report), ["Host", "Solo", "Solo", "Solo"]);
    }
}
