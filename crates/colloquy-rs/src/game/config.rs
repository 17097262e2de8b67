//! Session configuration.
//!
//! A [`SessionConfig`] covers everything a run needs besides the puzzle,
//! the cast, and the gateway: round and window bounds, per-role sampling
//! parameters, the question sentinel, the confirmation phrase list, cost
//! rates, and the retry policy. Defaults match the reference scenario
//! (15 rounds, window of 15, three players at temperature 0.8 with a
//! colder arbiter at 0.3).

use crate::api::retry::RetryPolicy;
use crate::api::usage::CostRates;

/// Default sentinel a player must include to address the arbiter.
pub const DEFAULT_SENTINEL: &str = "[ASK_ARBITER]";

/// Default confirmation phrases scanned for in arbiter replies.
///
/// Matching is case-sensitive substring search; see
/// [`is_confirmation`](super::scheduler::is_confirmation).
pub fn default_confirmation_phrases() -> Vec<String> {
    [
        "completely correct",
        "you solved it",
        "you cracked it",
        "congratulations",
        "that is the answer",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Configuration for one [`Session`](super::session::Session) run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model identifier sent with every gateway call.
    pub model: String,
    /// Maximum completed turns before the session times out.
    pub max_rounds: u32,
    /// Number of recent transcript entries shown to the next speaker.
    pub context_window: usize,
    /// Sampling temperature for player turns.
    pub participant_temperature: f32,
    /// Sampling temperature for arbiter verdicts.
    pub arbiter_temperature: f32,
    /// Output-token budget for player turns.
    pub participant_max_tokens: u32,
    /// Output-token budget for arbiter verdicts.
    pub arbiter_max_tokens: u32,
    /// Literal marker that turns an utterance into a question.
    pub sentinel: String,
    /// Substrings of an arbiter reply that signal a win.
    pub confirmation_phrases: Vec<String>,
    /// Rates for the end-of-run cost estimate.
    pub cost_rates: CostRates,
    /// Retry policy for transient gateway errors.
    pub retry: RetryPolicy,
}

impl SessionConfig {
    /// Create a config for the given model with all defaults.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    // ── Builder methods ───────────────────────────────────────────

    /// Set the maximum number of completed turns.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the context window (transcript entries shown per turn).
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    /// Set player and arbiter sampling temperatures.
    pub fn with_temperatures(mut self, participant: f32, arbiter: f32) -> Self {
        self.participant_temperature = participant;
        self.arbiter_temperature = arbiter;
        self
    }

    /// Set player and arbiter output-token budgets.
    pub fn with_token_budgets(mut self, participant: u32, arbiter: u32) -> Self {
        self.participant_max_tokens = participant;
        self.arbiter_max_tokens = arbiter;
        self
    }

    /// Set the question sentinel.
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    /// Replace the confirmation phrase list.
    pub fn with_confirmation_phrases(mut self, phrases: Vec<String>) -> Self {
        self.confirmation_phrases = phrases;
        self
    }

    /// Set the cost rates used by the usage summary.
    pub fn with_cost_rates(mut self, rates: CostRates) -> Self {
        self.cost_rates = rates;
        self
    }

    /// Enable retries for transient gateway errors.
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry = RetryPolicy::with_retries(max_retries);
        self
    }

    /// Check the configuration for orchestration-level mistakes.
    ///
    /// A failed validation is fatal to the session (terminal `Failed`),
    /// unlike gateway errors which are absorbed per turn.
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".into());
        }
        if self.max_rounds == 0 {
            return Err("max_rounds must be at least 1".into());
        }
        if self.context_window == 0 {
            return Err("context_window must be at least 1".into());
        }
        for (label, temp) in [
            ("participant", self.participant_temperature),
            ("arbiter", self.arbiter_temperature),
        ] {
            if !(0.0..=2.0).contains(&temp) {
                return Err(format!("{label} temperature {temp} outside [0, 2]"));
            }
        }
        if self.sentinel.is_empty() {
            return Err("sentinel must not be empty".into());
        }
        if self.confirmation_phrases.is_empty() {
            return Err("confirmation phrase list must not be empty".into());
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: crate::DEFAULT_MODEL.to_string(),
            max_rounds: 15,
            context_window: 15,
            participant_temperature: 0.8,
            arbiter_temperature: 0.3,
            participant_max_tokens: 1024,
            arbiter_max_tokens: 256,
            sentinel: DEFAULT_SENTINEL.to_string(),
            confirmation_phrases: default_confirmation_phrases(),
            cost_rates: CostRates::default(),
            retry: RetryPolicy::default(),
        }
    }
}
