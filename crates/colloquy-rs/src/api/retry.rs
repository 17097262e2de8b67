//! Retry policy for transient gateway errors.
//!
//! Retries transient HTTP/API errors (429, 500, 502, 503, 504, network
//! timeouts) with capped exponential backoff. Auth and bad-request errors
//! are never retried. A call that still fails after the last attempt is
//! absorbed by the calling participant as a placeholder utterance; the
//! policy never aborts a session.

use std::time::Duration;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries (0 = fail on the first error).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier per attempt.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(400),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given number of retries and default backoff.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// Backoff delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(base.min(self.max_delay.as_secs_f64()))
    }
}

/// Whether an error string indicates a transient (retryable) failure.
pub fn is_transient_error(error: &str) -> bool {
    let transient_statuses = ["429", "500", "502", "503", "504"];
    if transient_statuses
        .iter()
        .any(|s| error.contains(&format!("HTTP {s}")))
    {
        return true;
    }

    let lower = error.to_lowercase();
    [
        "request failed:",
        "connection reset",
        "connection refused",
        "timed out",
        "timeout",
        "broken pipe",
    ]
    .iter()
    .any(|p| lower.contains(p))
}
