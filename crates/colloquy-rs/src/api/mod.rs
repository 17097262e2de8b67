//! Gateway-call plumbing: the recorded-call wrapper, retry policy, and
//! token-usage accounting.
//!
//! Everything between the session loop and the [`Gateway`](crate::Gateway)
//! boundary lives here:
//!
//! - [`call_recorded`] — send one request, retrying transient failures per
//!   the [`RetryPolicy`](retry::RetryPolicy), and record reported usage
//!   into the caller's [`UsageTracker`](usage::UsageTracker).
//! - [`retry`] — transient-error detection and capped exponential backoff.
//! - [`usage`] — cumulative counters and the end-of-run cost summary.

pub mod retry;
pub mod usage;

pub use retry::RetryPolicy;
pub use usage::{CostRates, UsageSummary, UsageTracker};

use crate::{ChatCompletion, ChatRequest, Gateway};
use tracing::{debug, warn};

/// Send a chat request through the gateway, retrying transient errors and
/// recording reported token usage.
///
/// The usage tracker is mutated only on success; a call that exhausts its
/// retries returns the final error untouched for the caller to absorb.
pub async fn call_recorded(
    gateway: &dyn Gateway,
    body: &ChatRequest,
    policy: &retry::RetryPolicy,
    tracker: &mut usage::UsageTracker,
) -> Result<ChatCompletion, String> {
    let mut attempt = 0;
    loop {
        match gateway.chat(body.clone()).await {
            Ok(completion) => {
                if let Some(ref reported) = completion.usage {
                    tracker.record(reported);
                    debug!(
                        "token usage: prompt={}, completion={}, total={}",
                        reported.prompt_tokens.unwrap_or(0),
                        reported.completion_tokens.unwrap_or(0),
                        reported.total_tokens.unwrap_or(0),
                    );
                }
                return Ok(completion);
            }
            Err(error) if attempt < policy.max_retries && retry::is_transient_error(&error) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "transient gateway error (attempt {}/{}), retrying in {:?}: {error}",
                    attempt + 1,
                    policy.max_retries,
                    delay,
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatFuture, UsageInfo};
    use std::sync::Mutex;

    /// Scripted gateway: pops one canned result per call.
    struct Scripted {
        results: Mutex<Vec<Result<ChatCompletion, String>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(mut results: Vec<Result<ChatCompletion, String>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl Gateway for Scripted {
        fn chat(&self, _body: ChatRequest) -> ChatFuture<'_> {
            Box::pin(async move {
                *self.calls.lock().unwrap() += 1;
                self.results
                    .lock()
                    .unwrap()
                    .pop()
                    .unwrap_or_else(|| Err("script exhausted".into()))
            })
        }
    }

    fn completion(text: &str, total: u32) -> ChatCompletion {
        ChatCompletion {
            content: Some(text.into()),
            finish_reason: Some("stop".into()),
            usage: Some(UsageInfo {
                prompt_tokens: Some(total / 2),
                completion_tokens: Some(total - total / 2),
                total_tokens: Some(total),
            }),
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "test-model".into(),
            messages: vec![crate::Message::user("hi")],
            temperature: 0.5,
            max_tokens: 64,
        }
    }

    #[tokio::test]
    async fn records_usage_on_success() {
        let gateway = Scripted::new(vec![Ok(completion("hello", 10))]);
        let mut tracker = UsageTracker::new();
        let result = call_recorded(&gateway, &request(), &RetryPolicy::default(), &mut tracker)
            .await
            .unwrap();
        assert_eq!(result.usable_text(), Some("hello"));
        assert_eq!(tracker.total_tokens(), 10);
        assert_eq!(tracker.call_count(), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let gateway = Scripted::new(vec![
            Err("chat API HTTP 429: rate limited".into()),
            Ok(completion("recovered", 8)),
        ]);
        let policy = RetryPolicy {
            initial_delay: std::time::Duration::from_millis(1),
            ..RetryPolicy::with_retries(2)
        };
        let mut tracker = UsageTracker::new();
        let result = call_recorded(&gateway, &request(), &policy, &mut tracker)
            .await
            .unwrap();
        assert_eq!(result.usable_text(), Some("recovered"));
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn permanent_error_fails_without_retry() {
        let gateway = Scripted::new(vec![Err("chat API HTTP 401: unauthorized".into())]);
        let policy = RetryPolicy::with_retries(3);
        let mut tracker = UsageTracker::new();
        let result = call_recorded(&gateway, &request(), &policy, &mut tracker).await;
        assert!(result.is_err());
        assert_eq!(gateway.calls(), 1);
        assert_eq!(tracker.call_count(), 0);
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let gateway = Scripted::new(vec![
            Err("request failed: timed out".into()),
            Err("request failed: timed out".into()),
        ]);
        let policy = RetryPolicy {
            initial_delay: std::time::Duration::from_millis(1),
            ..RetryPolicy::with_retries(1)
        };
        let mut tracker = UsageTracker::new();
        let result = call_recorded(&gateway, &request(), &policy, &mut tracker).await;
        assert!(result.unwrap_err().contains("timed out"));
        assert_eq!(gateway.calls(), 2);
    }
}
