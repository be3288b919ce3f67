//! Speech transcript aggregation.
//!
//! The external recognition engine pushes [`RecognitionEvent`]s; each one
//! carries fragments marked final or interim.  [`TranscriptAggregator`]
//! folds them into a growing finalized transcript plus a transient interim
//! preview.
//!
//! ```text
//! recognition engine ──RecognitionEvent──▶ TranscriptAggregator
//!                                            ├─ finalized  (append-only, sent to the advisor)
//!                                            └─ interim    (replaced per event, display only)
//! ```

pub mod aggregator;

pub use aggregator::{Fragment, RecognitionEvent, TranscriptAggregator};
