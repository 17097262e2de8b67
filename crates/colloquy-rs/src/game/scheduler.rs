//! Turn scheduling and termination detection.
//!
//! [`TurnScheduler`] is the session's state machine: strict round-robin
//! rotation over a fixed participant list, sentinel-based classification
//! of utterances into discussion vs. questions, and substring-based win
//! detection over arbiter replies. It is pure synchronous logic: the
//! async session loop feeds it utterances and verdicts and reads back the
//! state, so every transition is testable without a gateway.

// ── Pure predicates ────────────────────────────────────────────────

/// Extract the question from an utterance, if it carries the sentinel.
///
/// The question is everything after the FIRST occurrence of the sentinel,
/// trimmed. An utterance with several sentinels still yields one question;
/// a sentinel followed by nothing still classifies as a question (the
/// arbiter will make of it what it can).
pub fn question_after_sentinel<'a>(utterance: &'a str, sentinel: &str) -> Option<&'a str> {
    let start = utterance.find(sentinel)? + sentinel.len();
    utterance.get(start..).map(str::trim)
}

/// Whether an arbiter reply signals a win.
///
/// Case-sensitive substring scan over the configured phrase list; a
/// phrase appearing anywhere in the reply, even incidentally, counts.
/// Deliberately kept a standalone pure function so the matching rule can
/// be hardened without touching the scheduler.
pub fn is_confirmation(reply: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|phrase| reply.contains(phrase.as_str()))
}

// ── State machine ──────────────────────────────────────────────────

/// Scheduler state. The last four variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for the current participant's utterance.
    AwaitingParticipant,
    /// The current utterance carried a question; waiting for the arbiter.
    AwaitingArbiter,
    Solved,
    TimedOut,
    Interrupted,
    Failed,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TurnState::Solved | TurnState::TimedOut | TurnState::Interrupted | TurnState::Failed
        )
    }
}

/// Round-robin turn scheduler with a round bound.
///
/// Rotation is fixed at construction and always advances by one completed
/// turn; an arbiter exchange happens inside the asking participant's
/// turn and never changes whose turn comes next. The round counter starts
/// at 1 and never exceeds `max_rounds`.
#[derive(Debug)]
pub struct TurnScheduler {
    participant_count: usize,
    current: usize,
    round: u32,
    max_rounds: u32,
    state: TurnState,
}

impl TurnScheduler {
    pub fn new(participant_count: usize, max_rounds: u32) -> Result<Self, String> {
        if participant_count == 0 {
            return Err("participant list must not be empty".into());
        }
        if max_rounds == 0 {
            return Err("max_rounds must be at least 1".into());
        }
        Ok(Self {
            participant_count,
            current: 0,
            round: 1,
            max_rounds,
            state: TurnState::AwaitingParticipant,
        })
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Current round, 1-based.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Index of the participant whose turn it is.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Classify a participant utterance. Returns the extracted question
    /// and moves to `AwaitingArbiter` when the sentinel is present.
    pub fn observe_utterance(&mut self, utterance: &str, sentinel: &str) -> Option<String> {
        if self.state != TurnState::AwaitingParticipant {
            return None;
        }
        let question = question_after_sentinel(utterance, sentinel)?.to_string();
        self.state = TurnState::AwaitingArbiter;
        Some(question)
    }

    /// Evaluate the arbiter's reply. Returns `true` (and goes terminal
    /// `Solved`) on a confirmation match; otherwise returns to awaiting
    /// the next participant.
    pub fn observe_verdict(&mut self, reply: &str, phrases: &[String]) -> bool {
        if self.state != TurnState::AwaitingArbiter {
            return false;
        }
        if is_confirmation(reply, phrases) {
            self.state = TurnState::Solved;
            true
        } else {
            self.state = TurnState::AwaitingParticipant;
            false
        }
    }

    /// Finish the current turn: advance the rotation and the round
    /// counter, or go terminal `TimedOut` when the bound is reached.
    pub fn complete_turn(&mut self) {
        if self.state != TurnState::AwaitingParticipant {
            return;
        }
        if self.round >= self.max_rounds {
            self.state = TurnState::TimedOut;
            return;
        }
        self.round += 1;
        self.current = (self.current + 1) % self.participant_count;
    }

    /// Honor an external cancellation between rounds.
    pub fn interrupt(&mut self) {
        if !self.state.is_terminal() {
            self.state = TurnState::Interrupted;
        }
    }

    /// Record an orchestration-level failure.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = TurnState::Failed;
        }
    }
}
