//! Turn-based transcript accumulation.
//!
//! Partial transcription deltas stream in per speaker while a turn is in
//! progress; on the turn boundary the pending text is committed as
//! immutable history entries.

/// Who produced a piece of transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Model,
}

/// One committed transcript row. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Accumulates partial transcripts and commits them as discrete turns.
#[derive(Debug, Default)]
pub struct TranscriptAggregator {
    pending_user: String,
    pending_model: String,
}

impl TranscriptAggregator {
    /// Creates an aggregator with empty pending buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a partial transcript delta to the speaker's pending buffer.
    pub fn append(&mut self, speaker: Speaker, text: &str) {
        match speaker {
            Speaker::User => self.pending_user.push_str(text),
            Speaker::Model => self.pending_model.push_str(text),
        }
    }

    /// Commits the current turn.
    ///
    /// Non-empty buffers become entries (user before model regardless of
    /// arrival order within the turn) and both buffers reset. Text is
    /// whitespace-trimmed; a buffer that is empty after trimming produces
    /// no entry.
    pub fn commit_turn(&mut self) -> Vec<TranscriptEntry> {
        let mut entries = Vec::new();

        let user = std::mem::take(&mut self.pending_user);
        let user = user.trim();
        if !user.is_empty() {
            entries.push(TranscriptEntry {
                speaker: Speaker::User,
                text: user.to_string(),
            });
        }

        let model = std::mem::take(&mut self.pending_model);
        let model = model.trim();
        if !model.is_empty() {
            entries.push(TranscriptEntry {
                speaker: Speaker::Model,
                text: model.to_string(),
            });
        }

        entries
    }

    /// Current pending text for a speaker (not yet committed).
    pub fn pending(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::User => &self.pending_user,
            Speaker::Model => &self.pending_model,
        }
    }
}
