//! Events and handlers for observing a session run.
//!
//! The session communicates with callers through [`SessionEvent`] variants
//! covering the whole lifecycle — round starts, utterances, arbiter
//! exchanges, degraded gateway calls, and every terminal transition.
//! Callers implement [`EventHandler`] for logging, console rendering, or
//! metrics; the handlers here cover the common cases.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests or fire-and-forget runs |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures |
//! | [`CompositeEventHandler`] | Several handlers in order |

use tracing::{debug, info, warn};

// ── Events ─────────────────────────────────────────────────────────

/// Events emitted by a [`Session`](super::session::Session) during a run.
#[derive(Debug)]
pub enum SessionEvent<'a> {
    /// A new turn is starting.
    RoundStart {
        round: u32,
        max_rounds: u32,
        speaker: &'a str,
    },
    /// A participant (or the arbiter) spoke; already in the transcript.
    Utterance { speaker: &'a str, text: &'a str },
    /// A player's utterance carried the sentinel; the extracted question
    /// is about to be put to the arbiter.
    QuestionPosed { speaker: &'a str, question: &'a str },
    /// The arbiter answered a question.
    ArbiterVerdict { text: &'a str },
    /// Token usage reported by the gateway for one call.
    TokenUsage {
        prompt_tokens: u32,
        completion_tokens: u32,
    },
    /// A gateway call failed outright; a placeholder utterance was recorded.
    CallFailed { speaker: &'a str, error: &'a str },
    /// The gateway returned empty or truncated text; a placeholder
    /// utterance was recorded. Often an output-budget misconfiguration
    /// rather than a transport problem.
    EmptyResponse {
        speaker: &'a str,
        finish_reason: &'a str,
    },
    /// An arbiter reply matched a confirmation phrase.
    Solved { round: u32 },
    /// The round limit was reached without a win.
    RoundLimitReached { max_rounds: u32 },
    /// The stop signal was observed between rounds.
    Interrupted,
    /// An orchestration-level error ended the session.
    Failed { reason: &'a str },
}

// ── Handler trait ──────────────────────────────────────────────────

/// Observer for session events.
///
/// All events are informational; the session never waits on a handler's
/// answer. Implementations just react: print, log, count.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &SessionEvent<'_>);
}

/// A handler that ignores every event.
pub struct NoopHandler;

impl EventHandler for NoopHandler {
    fn on_event(&self, _event: &SessionEvent<'_>) {}
}

/// An event handler backed by a closure.
pub struct FnEventHandler<F>(F)
where
    F: Fn(&SessionEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&SessionEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &SessionEvent<'_>) {
        (self.0)(event)
    }
}

/// Delegates every event to multiple inner handlers in registration order.
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Add a handler to the chain.
    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Conditionally add a handler; a no-op when `condition` is false.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// An event handler that logs via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &SessionEvent<'_>) {
        match event {
            SessionEvent::RoundStart {
                round,
                max_rounds,
                speaker,
            } => {
                info!("[round {round}/{max_rounds}] {speaker} to speak");
            }
            SessionEvent::Utterance { speaker, text } => {
                let preview: String = text.chars().take(200).collect();
                debug!(
                    "{speaker}: {preview}{}",
                    if text.chars().count() > 200 { "..." } else { "" }
                );
            }
            SessionEvent::QuestionPosed { speaker, question } => {
                info!("{speaker} asks the arbiter: {question}");
            }
            SessionEvent::ArbiterVerdict { text } => {
                info!("arbiter: {text}");
            }
            SessionEvent::TokenUsage {
                prompt_tokens,
                completion_tokens,
            } => {
                debug!("usage: prompt={prompt_tokens}, completion={completion_tokens}");
            }
            SessionEvent::CallFailed { speaker, error } => {
                warn!("gateway call for {speaker} failed: {error}");
            }
            SessionEvent::EmptyResponse {
                speaker,
                finish_reason,
            } => {
                warn!(
                    "gateway returned no text for {speaker} (finish_reason={finish_reason}); \
                     check the output-token budget"
                );
            }
            SessionEvent::Solved { round } => {
                info!("puzzle solved in round {round}");
            }
            SessionEvent::RoundLimitReached { max_rounds } => {
                info!("round limit reached ({max_rounds})");
            }
            SessionEvent::Interrupted => {
                info!("session interrupted");
            }
            SessionEvent::Failed { reason } => {
                warn!("session failed: {reason}");
            }
        }
    }
}
