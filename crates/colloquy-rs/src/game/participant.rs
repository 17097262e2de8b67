//! Participants and the arbiter.
//!
//! Each participant owns a private message history whose first entry is
//! its fixed behavioral instruction; the history only ever grows, one
//! user/assistant pair per turn. Gateway failures never escape a turn:
//! the participant records a fixed placeholder utterance instead, so turn
//! order and context shape survive any number of bad calls.

use crate::api::retry::RetryPolicy;
use crate::api::usage::UsageTracker;
use crate::game::events::{EventHandler, SessionEvent};
use crate::game::puzzle::{ARBITER_NAME, Puzzle, RoleSpec, arbiter_instruction};
use crate::{ChatRequest, Gateway, Message};
use tracing::warn;

/// Recorded in place of an utterance when the gateway call fails.
pub const FAILED_CALL_PLACEHOLDER: &str = "[no reply: model call failed]";

/// Recorded in place of an utterance when the gateway returns empty or
/// truncated text.
pub const EMPTY_RESPONSE_PLACEHOLDER: &str = "[no reply: model returned empty output]";

/// Sampling parameters for one speaker's gateway calls.
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

// ── Shared turn mechanics ──────────────────────────────────────────

/// Append a user prompt, call the gateway, absorb any failure into a
/// placeholder, append the outcome as an assistant message, and return it.
///
/// The assistant message is appended on every path, including failures,
/// so the history stays an alternating user/assistant sequence.
#[allow(clippy::too_many_arguments)]
async fn exchange(
    speaker: &str,
    history: &mut Vec<Message>,
    settings: &CallSettings,
    gateway: &dyn Gateway,
    usage: &mut UsageTracker,
    retry: &RetryPolicy,
    events: &dyn EventHandler,
    prompt: String,
) -> String {
    history.push(Message::user(prompt));

    let body = ChatRequest {
        model: settings.model.clone(),
        messages: history.clone(),
        temperature: settings.temperature,
        max_tokens: settings.max_tokens,
    };

    let text = match crate::api::call_recorded(gateway, &body, retry, usage).await {
        Ok(completion) => {
            if let Some(ref reported) = completion.usage {
                events.on_event(&SessionEvent::TokenUsage {
                    prompt_tokens: reported.prompt_tokens.unwrap_or(0),
                    completion_tokens: reported.completion_tokens.unwrap_or(0),
                });
            }
            match completion.usable_text() {
                Some(text) => text.to_string(),
                None => {
                    let finish_reason = completion.finish_reason.as_deref().unwrap_or("unknown");
                    warn!(
                        "empty response for {speaker} (finish_reason={finish_reason}); \
                         recording placeholder"
                    );
                    events.on_event(&SessionEvent::EmptyResponse {
                        speaker,
                        finish_reason,
                    });
                    EMPTY_RESPONSE_PLACEHOLDER.to_string()
                }
            }
        }
        Err(error) => {
            warn!("gateway call for {speaker} failed: {error}; recording placeholder");
            events.on_event(&SessionEvent::CallFailed {
                speaker,
                error: &error,
            });
            FAILED_CALL_PLACEHOLDER.to_string()
        }
    };

    history.push(Message::assistant(text.clone()));
    text
}

// ── Participant ────────────────────────────────────────────────────

/// A non-privileged player: a name, a fixed instruction, and a private
/// history nobody else reads.
pub struct Participant {
    name: String,
    history: Vec<Message>,
    settings: CallSettings,
}

impl Participant {
    pub fn new(role: &RoleSpec, settings: CallSettings) -> Self {
        Self {
            name: role.name.clone(),
            history: vec![Message::system(&role.instruction)],
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The private history. The first entry is always the behavioral
    /// instruction.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Take one turn: see the shared context, speak or ask.
    ///
    /// Returns the utterance verbatim, or a placeholder string when the
    /// gateway call failed or came back empty. Mutates only this
    /// participant's own history.
    pub async fn act(
        &mut self,
        gateway: &dyn Gateway,
        usage: &mut UsageTracker,
        retry: &RetryPolicy,
        events: &dyn EventHandler,
        context: &str,
        sentinel: &str,
    ) -> String {
        let prompt = turn_prompt(context, sentinel);
        exchange(
            &self.name,
            &mut self.history,
            &self.settings,
            gateway,
            usage,
            retry,
            events,
            prompt,
        )
        .await
    }
}

/// The per-turn instruction shown to a player along with the context.
fn turn_prompt(context: &str, sentinel: &str) -> String {
    format!(
        "Current discussion:\n{context}\n\n\
         It is your turn. You may either:\n\
         1. Share your reasoning with the other players, or\n\
         2. Ask the host one yes/no question — in that case your message \
         must contain the marker {sentinel} followed by the question.\n\n\
         Ask at most one question per turn, and do not use the marker unless \
         you are asking."
    )
}

// ── Arbiter ────────────────────────────────────────────────────────

/// The privileged participant: same turn mechanics as a player, but its
/// instruction carries the solution and it only answers extracted
/// questions.
pub struct Arbiter {
    history: Vec<Message>,
    settings: CallSettings,
}

impl Arbiter {
    pub fn new(puzzle: &Puzzle, settings: CallSettings) -> Self {
        Self {
            history: vec![Message::system(arbiter_instruction(puzzle))],
            settings,
        }
    }

    pub fn name(&self) -> &str {
        ARBITER_NAME
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Answer one extracted question with a short verdict.
    pub async fn judge(
        &mut self,
        gateway: &dyn Gateway,
        usage: &mut UsageTracker,
        retry: &RetryPolicy,
        events: &dyn EventHandler,
        asker: &str,
        question: &str,
    ) -> String {
        let prompt = format!(
            "Player {asker} asks: {question}\n\n\
             Answer per your rules — \"Yes.\" / \"No.\" / \"Irrelevant.\" / \
             \"That is an important question.\" — and keep it short. Confirm \
             only a fully correct solution."
        );
        exchange(
            ARBITER_NAME,
            &mut self.history,
            &self.settings,
            gateway,
            usage,
            retry,
            events,
            prompt,
        )
        .await
    }
}
