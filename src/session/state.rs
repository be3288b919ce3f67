//! Session phase and shared session state.
//!
//! [`SessionPhase`] is the controller's two-state machine.  The UI reads
//! everything else it needs from [`SessionState`] through [`SharedState`].
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionState>>`: cheap to
//! clone and safe to share with the poll timer task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::advice::{AdviceLog, Snapshot};
use crate::emotion::EmotionTracker;
use crate::transcript::TranscriptAggregator;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// States of a coaching session.
///
/// ```text
/// Idle ──start──▶ Listening
///      ◀──stop───          (advances the script)
/// ```
///
/// Reaching the end of the script is not a separate state: the navigator
/// keeps returning the terminal line and rounds can continue indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Waiting for the user to start a round.
    #[default]
    Idle,

    /// Speech capture and the advice poller are running.
    Listening,
}

impl SessionPhase {
    pub fn is_listening(&self) -> bool {
        matches!(self, SessionPhase::Listening)
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Listening => "Listening",
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything a UI needs to render a session.
///
/// Only the controller mutates it; the poller's snapshot provider reads it.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Current phase of the session.
    pub phase: SessionPhase,

    /// `true` from the start of a round until its first advice arrives.
    pub generating: bool,

    /// The script line that is live right now.
    pub prompt: String,

    pub transcript: TranscriptAggregator,
    pub emotion: EmotionTracker,
    pub advice: AdviceLog,
}

impl SessionState {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// The `{emotion, transcript}` pair for the advisor.  Interim speech is
    /// never included.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            emotion: self.emotion.snapshot(),
            transcript: self.transcript.snapshot(),
        }
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
///
/// Lock with [`lock_state`] for a short critical section; do **not** hold
/// the lock across `.await` points.
pub type SharedState = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedState`] showing `prompt`.
pub fn new_shared_state(prompt: impl Into<String>) -> SharedState {
    Arc::new(Mutex::new(SessionState::new(prompt)))
}

/// Lock the shared state, recovering the data if a holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Fragment, RecognitionEvent};

    #[test]
    fn default_phase_is_idle() {
        assert_eq!(SessionPhase::default(), SessionPhase::Idle);
        assert!(!SessionPhase::Idle.is_listening());
        assert!(SessionPhase::Listening.is_listening());
    }

    #[test]
    fn labels() {
        assert_eq!(SessionPhase::Idle.label(), "Idle");
        assert_eq!(SessionPhase::Listening.label(), "Listening");
    }

    #[test]
    fn new_state_is_blank() {
        let state = SessionState::new("Welcome!");
        assert_eq!(state.prompt, "Welcome!");
        assert!(!state.generating);
        assert!(state.advice.is_empty());
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn snapshot_combines_emotion_and_final_transcript() {
        let mut state = SessionState::new("");
        state.emotion.set("sad");
        state.transcript.apply(&RecognitionEvent::new(vec![
            Fragment::final_text("I feel bad"),
            Fragment::interim("tod"),
        ]));

        assert_eq!(state.snapshot(), Snapshot::new("sad", "I feel bad "));
    }

    #[test]
    fn shared_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SharedState>();
    }

    #[test]
    fn lock_state_recovers_from_poison() {
        let state = new_shared_state("p");
        let poisoner = Arc::clone(&state);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(state.is_poisoned());
        assert_eq!(lock_state(&state).prompt, "p");
    }
}
