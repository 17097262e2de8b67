//! Turn-based multi-agent deduction-game driver for LLM "players".
//!
//! `colloquy-rs` runs a scripted lateral-thinking game ("turtle soup"): a
//! cast of player agents discusses a puzzle in strict round-robin order and
//! may direct sentinel-tagged yes/no questions at a privileged **arbiter**
//! who knows the solution. The core abstraction is the
//! [`Session`](game::session::Session) — a bounded loop that selects the
//! next speaker, sends its private history to a chat-completion endpoint,
//! appends the reply to a shared transcript, and evaluates termination
//! (solved / timeout / interrupted / failed) after every turn.
//!
//! # Getting started
//!
//! ```ignore
//! use colloquy_rs::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let api_key = std::env::var("COLLOQUY_API_KEY").unwrap();
//!     let client = ChatClient::new("https://api.deepseek.com", api_key)?;
//!
//!     let puzzles = builtin_puzzles();
//!     let config = SessionConfig::new("deepseek-chat").with_max_rounds(15);
//!
//!     let report = Session::new(&client, puzzles[0].clone(), default_cast(), config)
//!         .with_event_handler(&LoggingHandler)
//!         .run()
//!         .await;
//!
//!     println!("{:?}", report.outcome);
//!     println!("{}", report.usage);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`game`] | [`Session`](game::session::Session) driver, [`TurnScheduler`](game::scheduler::TurnScheduler) state machine, participants, transcript, puzzles, events |
//! | [`api`] | Gateway-call wrapper, retry policy, token-usage accounting |
//!
//! The gateway boundary is the [`Gateway`] trait; [`ChatClient`] is the
//! production implementation for any OpenAI-compatible
//! `/v1/chat/completions` endpoint, and tests substitute scripted
//! implementations.

pub mod api;
pub mod game;
pub mod prelude;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// ── Constants ──────────────────────────────────────────────────────

/// Default model for all gateway calls.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Request-level timeout for the HTTP gateway client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in a participant's private history.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A role-tagged message.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

// ── Request / response types ───────────────────────────────────────

/// Chat completion request body (OpenAI-compatible subset).
#[derive(Serialize, Clone, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Raw API response (internal deserialization target).
#[derive(Deserialize, Debug)]
struct RawChatResponse {
    choices: Option<Vec<RawChoice>>,
    error: Option<ApiErrorResponse>,
    #[serde(default)]
    usage: Option<UsageInfo>,
}

#[derive(Deserialize, Debug)]
struct RawChoice {
    message: RawResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    message: String,
}

/// Clean return type from a gateway call.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    pub content: Option<String>,
    /// `"stop"`, `"length"`, or provider-specific.
    pub finish_reason: Option<String>,
    pub usage: Option<UsageInfo>,
}

impl ChatCompletion {
    /// The generated text, if it is non-empty after trimming.
    ///
    /// A `length` finish reason with empty text is a soft failure and
    /// yields `None` here like any other empty response.
    pub fn usable_text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Token usage counters reported by the API for one call.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UsageInfo {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

// ── Gateway trait ──────────────────────────────────────────────────

/// Boxed future returned by [`Gateway::chat`], so the trait stays
/// dyn-compatible (object-safe).
pub type ChatFuture<'a> = Pin<Box<dyn Future<Output = Result<ChatCompletion, String>> + Send + 'a>>;

/// The model-service boundary.
///
/// Exactly one `chat` call is ever outstanding at a time: the session
/// loop awaits each call to completion before issuing the next. Scripted
/// implementations back the test suite; [`ChatClient`] is the production
/// one.
pub trait Gateway: Send + Sync {
    /// Send one chat-completion request and return the generated text,
    /// finish reason, and usage counters.
    fn chat(&self, body: ChatRequest) -> ChatFuture<'_>;
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Normalize a base URL so it ends in `/v1` with no trailing slash.
///
/// Accepts `https://host`, `https://host/`, and `https://host/v1` alike.
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

impl ChatClient {
    /// Create a new client for the given endpoint.
    ///
    /// The base URL may omit the `/v1` suffix; it is appended when missing.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("colloquy-client/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url.as_ref()),
            api_key: api_key.into(),
        })
    }

    /// Send a chat completion request.
    pub async fn request(&self, body: &ChatRequest) -> Result<ChatCompletion, String> {
        debug!(
            "gateway request: model={}, messages={}, max_tokens={}, temp={}",
            body.model,
            body.messages.len(),
            body.max_tokens,
            body.temperature,
        );
        trace!(
            "request payload size: {} bytes",
            serde_json::to_string(body).map_or(0, |s| s.len())
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;

        debug!(
            "gateway response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if !status.is_success() {
            return Err(format!("chat API HTTP {status}: {text}"));
        }

        let parsed: RawChatResponse =
            serde_json::from_str(&text).map_err(|e| format!("failed to parse response: {e}"))?;

        if let Some(err) = parsed.error {
            return Err(format!("chat API error: {}", err.message));
        }

        let choice = parsed.choices.and_then(|c| c.into_iter().next());

        match choice {
            Some(c) => Ok(ChatCompletion {
                content: c.message.content,
                finish_reason: c.finish_reason,
                usage: parsed.usage,
            }),
            None => Ok(ChatCompletion {
                content: None,
                finish_reason: None,
                usage: parsed.usage,
            }),
        }
    }
}

impl Gateway for ChatClient {
    fn chat(&self, body: ChatRequest) -> ChatFuture<'_> {
        Box::pin(async move { self.request(&body).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "hello");

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);

        let assist = Message::assistant("reply");
        assert_eq!(assist.role, MessageRole::Assistant);
        assert_eq!(assist.content, "reply");
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_value(Message::system("x")).unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn base_url_normalization() {
        assert_eq!(normalize_base_url("https://host"), "https://host/v1");
        assert_eq!(normalize_base_url("https://host/"), "https://host/v1");
        assert_eq!(normalize_base_url("https://host/v1"), "https://host/v1");
        assert_eq!(normalize_base_url("https://host/v1/"), "https://host/v1");
    }

    #[test]
    fn raw_response_parses() {
        let raw = r#"{
            "choices": [{
                "message": {"content": "Yes."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: RawChatResponse = serde_json::from_str(raw).unwrap();
        let choice = parsed.choices.unwrap().into_iter().next().unwrap();
        assert_eq!(choice.message.content.as_deref(), Some("Yes."));
        assert_eq!(choice.finish_reason.as_deref(), Some("stop"));
        assert_eq!(parsed.usage.unwrap().total_tokens, Some(15));
    }

    #[test]
    fn usable_text_rejects_empty_and_whitespace() {
        let empty = ChatCompletion {
            content: Some(String::new()),
            finish_reason: Some("length".into()),
            usage: None,
        };
        assert!(empty.usable_text().is_none());

        let blank = ChatCompletion {
            content: Some("   \n".into()),
            finish_reason: Some("stop".into()),
            usage: None,
        };
        assert!(blank.usable_text().is_none());

        let ok = ChatCompletion {
            content: Some("a reply".into()),
            finish_reason: Some("stop".into()),
            usage: None,
        };
        assert_eq!(ok.usable_text(), Some("a reply"));
    }
}
