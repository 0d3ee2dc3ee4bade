//! Append-only deployment transcript.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptLevel {
    Info,
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub at: DateTime<Local>,
    pub level: TranscriptLevel,
    pub message: String,
}

impl TranscriptEntry {
    pub fn is_failure(&self) -> bool {
        self.level == TranscriptLevel::Failure
    }
}

/// Messages are only ever appended; nothing replaces earlier entries.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Blank messages are dropped and yield `None`.
    pub fn append(&self, level: TranscriptLevel, message: &str) -> Option<TranscriptEntry> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }
        let entry = TranscriptEntry {
            at: Local::now(),
            level,
            message: message.to_string(),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Some(entry)
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
