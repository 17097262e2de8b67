//! The shared conversation transcript and its context window.
//!
//! The transcript is append-only: it is created with the seeded puzzle
//! statement, grows by one entry per utterance, and is never rewritten.
//! Participants see it only through [`Transcript::window`], which renders
//! the most recent entries as a single context block.

/// One tagged utterance in the shared transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
}

/// Append-only, ordered record of every utterance in a session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Utterance>,
}

impl Transcript {
    /// Create a transcript seeded with the opening statement (the puzzle).
    pub fn seeded(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        let mut transcript = Self::default();
        transcript.push(speaker, text);
        transcript
    }

    /// Append one utterance.
    pub fn push(&mut self, speaker: impl Into<String>, text: impl Into<String>) {
        self.entries.push(Utterance {
            speaker: speaker.into(),
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }

    /// Render the last `min(window, len)` entries as `"[speaker] text"`
    /// lines joined by newlines, in original order.
    ///
    /// Pure and deterministic; an empty transcript yields an empty string.
    pub fn window(&self, window: usize) -> String {
        let start = self.entries.len().saturating_sub(window);
        self.entries[start..]
            .iter()
            .map(|u| format!("[{}] {}", u.speaker, u.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
