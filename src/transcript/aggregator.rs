//! Merge of finalized and in-progress speech fragments.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Fragment / RecognitionEvent
// ---------------------------------------------------------------------------

/// One unit of recognized speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    /// `true` once the engine will no longer revise this fragment.
    pub is_final: bool,
}

impl Fragment {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// A batch of fragments delivered by one recognition callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionEvent {
    pub fragments: Vec<Fragment>,
}

impl RecognitionEvent {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self { fragments }
    }
}

// ---------------------------------------------------------------------------
// TranscriptAggregator
// ---------------------------------------------------------------------------

/// Holds the finalized transcript and the current interim preview.
///
/// `finalized` only ever grows.  `interim` is replaced wholesale by every
/// event and cleared by [`clear_interim`](Self::clear_interim) when
/// recognition stops.
///
/// ```
/// use voice_coach::transcript::{Fragment, RecognitionEvent, TranscriptAggregator};
///
/// let mut agg = TranscriptAggregator::new();
/// agg.apply(&RecognitionEvent::new(vec![
///     Fragment::final_text("I feel"),
///     Fragment::interim("ba"),
/// ]));
/// assert_eq!(agg.finalized(), "I feel ");
/// assert_eq!(agg.interim(), "ba");
/// assert_eq!(agg.snapshot(), "I feel ");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptAggregator {
    finalized: String,
    interim: String,
    final_fragments: usize,
}

impl TranscriptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one recognition event into the transcript.
    ///
    /// Final fragments are appended first, each followed by one space; the
    /// interim fragments of the same event then replace `interim`.
    ///
    /// Returns `true` when either part changed, so the caller knows whether
    /// to notify listeners.
    pub fn apply(&mut self, event: &RecognitionEvent) -> bool {
        let before_final = self.final_fragments;
        let mut interim = String::new();

        for fragment in &event.fragments {
            if fragment.is_final {
                self.finalized.push_str(&fragment.text);
                self.finalized.push(' ');
                self.final_fragments += 1;
            } else {
                interim.push_str(&fragment.text);
            }
        }

        let interim_changed = interim != self.interim;
        self.interim = interim;

        self.final_fragments != before_final || interim_changed
    }

    /// Drop the interim preview.  Returns `true` if there was one.
    pub fn clear_interim(&mut self) -> bool {
        let had_interim = !self.interim.is_empty();
        self.interim.clear();
        had_interim
    }

    /// Transcript text sent to the advisor: finalized text only.
    pub fn snapshot(&self) -> String {
        self.finalized.clone()
    }

    pub fn finalized(&self) -> &str {
        &self.finalized
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
