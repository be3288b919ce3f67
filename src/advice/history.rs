//! Append-only advice log with content-based deduplication.

use serde::Serialize;

use super::client::{AdviceError, AdviceReply};

/// Text of the entry appended for every transport or parse failure.
pub const BACKEND_ERROR_MESSAGE: &str = "error contacting backend";

/// Whether an entry carries advice or an error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    Advice,
    Error,
}

/// One visible line in the advice log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceEntry {
    pub text: String,
    pub kind: EntryKind,
}

/// Ordered advice and error entries for one session.
///
/// Never truncated.  An advice entry whose text already appears anywhere in
/// the log is dropped; error entries are always appended.
#[derive(Debug, Clone, Default)]
pub struct AdviceLog {
    entries: Vec<AdviceEntry>,
}

impl AdviceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append advice unless the exact text is already logged.
    ///
    /// Returns `true` when the entry was appended.
    pub fn push_advice(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.contains_text(&text) {
            log::debug!("advice: duplicate advice dropped (len={})", text.len());
            return false;
        }
        self.entries.push(AdviceEntry {
            text,
            kind: EntryKind::Advice,
        });
        true
    }

    /// Append an error entry.  Repeats are kept.
    pub fn push_error(&mut self, text: impl Into<String>) {
        self.entries.push(AdviceEntry {
            text: text.into(),
            kind: EntryKind::Error,
        });
    }

    /// Fold the result of one advice request into the log.
    ///
    /// Returns the appended entry, or `None` when nothing was appended
    /// (duplicate advice or an empty reply).
    pub fn record(&mut self, result: &Result<AdviceReply, AdviceError>) -> Option<&AdviceEntry> {
        let appended = match result {
            Ok(AdviceReply::Advice(text)) => self.push_advice(text.as_str()),
            Ok(AdviceReply::Error(text)) => {
                self.push_error(text.as_str());
                true
            }
            Ok(AdviceReply::Empty) => false,
            Err(e) => {
                log::warn!("advice: request failed: {e}");
                self.push_error(BACKEND_ERROR_MESSAGE);
                true
            }
        };
        if appended {
            self.entries.last()
        } else {
            None
        }
    }

    pub fn entries(&self) -> &[AdviceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains_text(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e.text == text)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
