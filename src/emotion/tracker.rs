//! Last-write-wins emotion store and classifier result parsing.

/// Holds the most recent emotion label.
///
/// No validation: whatever the classifier reports is stored as-is.
#[derive(Debug, Clone, Default)]
pub struct EmotionTracker {
    current: String,
}

impl EmotionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the current label.  Returns `true` if it changed.
    pub fn set(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if label == self.current {
            return false;
        }
        self.current = label;
        true
    }

    pub fn snapshot(&self) -> String {
        self.current.clone()
    }

    pub fn current(&self) -> &str {
        &self.current
    }
}

/// Extract the label from a classifier result such as
/// `"Detected emotion: happy"`.
///
/// Returns `None` when the prefix is missing or the label is blank.
///
/// ```
/// use voice_coach::emotion::parse_detected_emotion;
///
/// let prefix = "Detected emotion: ";
/// assert_eq!(parse_detected_emotion("Detected emotion: sad ", prefix), Some("sad".into()));
/// assert_eq!(parse_detected_emotion("Received image of size: 10 bytes", prefix), None);
/// ```
pub fn parse_detected_emotion(result: &str, prefix: &str) -> Option<String> {
    let label = result.strip_prefix(prefix)?.trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
