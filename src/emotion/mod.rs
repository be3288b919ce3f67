//! Latest emotion label reported by the external classifier.

pub mod tracker;

pub use tracker::{parse_detected_emotion, EmotionTracker};
