//! Session orchestration for the voice coach.
//!
//! This module wires the scripted prompts, transcript, emotion label and
//! advice poller into one state machine, and exposes the shared state a UI
//! reads.
//!
//! # Architecture
//!
//! ```text
//! UI / recognition engine / classifier
//!        │  SessionCommand (mpsc, via SessionHandle)
//!        ▼
//! SessionController::run()  ← async tokio task
//!        │
//!        ├─ Start / Stop / Toggle → playback, poller, capture, script
//!        ├─ Recognition          → TranscriptAggregator
//!        ├─ Emotion              → EmotionTracker
//!        └─ AdviceDelivery (mpsc from request tasks) → AdviceLog
//!
//! SharedState (Arc<Mutex<SessionState>>) ←── read by the UI and the poll timer
//! ```

pub mod controller;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use controller::{
    SessionClosed, SessionCommand, SessionController, SessionHandle, SessionUpdate,
};
pub use state::{lock_state, new_shared_state, SessionPhase, SessionState, SharedState};
