//! Session controller: drives one coaching session.
//!
//! [`SessionController`] owns the script cursor, the advice poller, the
//! playback gateway and the speech capture handle.  It is the single
//! consumer of two queues:
//!
//! * [`SessionCommand`]s from the UI and the external recognition /
//!   classification sources, sent through a [`SessionHandle`];
//! * [`AdviceDelivery`]s from the poller's request tasks.
//!
//! # Round flow
//!
//! ```text
//! Start (Idle → Listening)
//!   ├─ generating = true
//!   ├─ play current script line
//!   ├─ poller.start(snapshot of SharedState)
//!   └─ acquire speech capture, accept Recognition / Emotion events
//!
//! Stop (Listening → Idle)
//!   ├─ cancel playback
//!   ├─ poller.stop()
//!   ├─ generating = false
//!   ├─ script.advance()
//!   └─ release speech capture, clear interim, ignore further events
//! ```
//!
//! Requests that are already in flight when a round stops still deliver;
//! [`LateResponsePolicy`] decides whether they reach the log.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::advice::{AdviceClient, AdviceDelivery, AdviceEntry, AdvicePoller, AdviceReply};
use crate::capture::{CaptureError, SpeechCapture};
use crate::config::{AppConfig, LateResponsePolicy};
use crate::script::{ScriptNavigator, ScriptPlan};
use crate::transcript::RecognitionEvent;
use crate::voice::{VoicePlayback, VoiceRequest};

use super::state::{lock_state, new_shared_state, SessionPhase, SharedState};

// ---------------------------------------------------------------------------
// Commands and updates
// ---------------------------------------------------------------------------

/// Inputs to the controller's event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Begin a listening round (no-op while listening).
    Start,
    /// End the current round (no-op while idle).
    Stop,
    /// Start when idle, stop when listening.
    Toggle,
    /// Recognized speech pushed by the recognition engine.
    Recognition(RecognitionEvent),
    /// A fresh label pushed by the emotion classifier.
    Emotion(String),
    /// Tear the session down and leave the event loop.
    Shutdown,
}

/// Change notifications for a UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Phase(SessionPhase),
    Prompt(String),
    Transcript { finalized: String, interim: String },
    Emotion(String),
    Advice(AdviceEntry),
    Generating(bool),
    /// The terminal line became live; sent once.
    ScriptComplete,
}

/// Returned by [`SessionHandle`] once the controller has shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("session has shut down")]
pub struct SessionClosed;

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Cloneable sender side of the controller's command queue.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Create a handle and the receiver to pass to [`SessionController::run`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.tx.send(command).await.map_err(|_| SessionClosed)
    }

    pub async fn start(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Start).await
    }

    pub async fn stop(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Stop).await
    }

    pub async fn toggle(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Toggle).await
    }

    pub async fn recognized(&self, event: RecognitionEvent) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Recognition(event)).await
    }

    pub async fn emotion(&self, label: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Emotion(label.into())).await
    }

    pub async fn shutdown(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Drives one coaching session.
///
/// Create with [`SessionController::new`], then either call the transition
/// methods directly or hand the controller to [`run`](Self::run) inside a
/// tokio task.  Dropping the controller tears it down.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use voice_coach::advice::HttpAdviceClient;
/// use voice_coach::capture::NoSpeechCapture;
/// use voice_coach::config::AppConfig;
/// use voice_coach::session::{SessionController, SessionHandle};
/// use voice_coach::voice::SilentPlayback;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let client = Arc::new(HttpAdviceClient::from_config(&config.advisor));
/// let controller = SessionController::new(
///     config,
///     client,
///     Arc::new(SilentPlayback),
///     Arc::new(NoSpeechCapture),
/// );
///
/// let (handle, commands) = SessionHandle::channel(64);
/// let task = tokio::spawn(controller.run(commands));
///
/// handle.start().await.unwrap();
/// handle.emotion("sad").await.unwrap();
/// handle.shutdown().await.unwrap();
/// task.await.unwrap();
/// # }
/// ```
pub struct SessionController {
    config: AppConfig,
    state: SharedState,
    script: ScriptNavigator,
    poller: AdvicePoller,
    deliveries: mpsc::UnboundedReceiver<AdviceDelivery>,
    playback: Arc<dyn VoicePlayback>,
    capture: Arc<dyn SpeechCapture>,
    updates: Option<mpsc::UnboundedSender<SessionUpdate>>,
    round: u64,
    torn_down: bool,
}

impl SessionController {
    /// Create an idle controller positioned on the first script line.
    ///
    /// # Arguments
    ///
    /// * `config`  : application config (script, advisor, voice).
    /// * `client`  : advisory backend (e.g. `HttpAdviceClient`).
    /// * `playback`: voice gateway for script lines.
    /// * `capture` : start/stop handle for the recognition engine.
    pub fn new(
        config: AppConfig,
        client: Arc<dyn AdviceClient>,
        playback: Arc<dyn VoicePlayback>,
        capture: Arc<dyn SpeechCapture>,
    ) -> Self {
        let script = ScriptNavigator::new(ScriptPlan::from_config(&config.script));
        let (poller, deliveries) = AdvicePoller::new(client, &config.advisor);
        let state = new_shared_state(script.current());

        Self {
            config,
            state,
            script,
            poller,
            deliveries,
            playback,
            capture,
            updates: None,
            round: 0,
            torn_down: false,
        }
    }

    /// Publish [`SessionUpdate`]s on `tx`.
    pub fn with_updates(mut self, tx: mpsc::UnboundedSender<SessionUpdate>) -> Self {
        self.updates = Some(tx);
        self
    }

    /// Shared state handle for readers (UI, tests).
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    pub fn phase(&self) -> SessionPhase {
        lock_state(&self.state).phase
    }

    pub fn current_prompt(&self) -> &str {
        self.script.current()
    }

    /// Number of listening rounds started so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Process commands and advice deliveries until `Shutdown` arrives or
    /// every [`SessionHandle`] is dropped, then tear down.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                Some(delivery) = self.deliveries.recv() => {
                    self.on_delivery(delivery);
                }
            }
        }

        log::info!("session: command channel closed, controller shutting down");
        self.teardown();
    }

    /// Apply one command.
    pub fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start => self.start_listening(),
            SessionCommand::Stop => self.stop_listening(),
            SessionCommand::Toggle => self.toggle(),
            SessionCommand::Recognition(event) => self.on_recognition(&event),
            SessionCommand::Emotion(label) => self.on_emotion(label),
            SessionCommand::Shutdown => self.teardown(),
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Idle → Listening.
    pub fn start_listening(&mut self) {
        if self.torn_down {
            log::warn!("session: start ignored after teardown");
            return;
        }
        if self.phase().is_listening() {
            log::debug!("session: already listening");
            return;
        }

        self.round += 1;
        log::info!(
            "session: round {} → Listening (line {})",
            self.round,
            self.script.index()
        );

        lock_state(&self.state).generating = true;
        self.notify(SessionUpdate::Generating(true));

        self.playback
            .play(VoiceRequest::for_line(&self.config, self.script.current()));

        let state = Arc::clone(&self.state);
        self.poller
            .start(self.round, move || lock_state(&state).snapshot());

        match self.capture.start() {
            Ok(()) => {}
            Err(CaptureError::Unsupported) => {
                log::warn!("session: speech recognition unavailable, continuing without it");
            }
            Err(e) => log::warn!("session: {e}"),
        }

        lock_state(&self.state).phase = SessionPhase::Listening;
        self.notify(SessionUpdate::Phase(SessionPhase::Listening));
    }

    /// Listening → Idle.
    pub fn stop_listening(&mut self) {
        if !self.phase().is_listening() {
            log::debug!("session: stop ignored while idle");
            return;
        }

        self.playback.cancel();
        self.poller.stop();

        lock_state(&self.state).generating = false;
        self.notify(SessionUpdate::Generating(false));

        let was_complete = self.script.is_complete();
        self.script.advance();
        let prompt = self.script.current().to_string();
        let just_completed = !was_complete && self.script.is_complete();

        self.capture.stop();

        let transcript = {
            let mut st = lock_state(&self.state);
            st.phase = SessionPhase::Idle;
            st.prompt = prompt.clone();
            st.transcript
                .clear_interim()
                .then(|| st.transcript.finalized().to_string())
        };

        log::info!("session: round {} → Idle", self.round);

        if let Some(finalized) = transcript {
            self.notify(SessionUpdate::Transcript {
                finalized,
                interim: String::new(),
            });
        }
        self.notify(SessionUpdate::Prompt(prompt));
        if just_completed {
            log::info!("session: script complete");
            self.notify(SessionUpdate::ScriptComplete);
        }
        self.notify(SessionUpdate::Phase(SessionPhase::Idle));
    }

    pub fn toggle(&mut self) {
        if self.phase().is_listening() {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    /// Release everything the session holds.  Idempotent.
    ///
    /// A listening round is stopped first.  After teardown no timer tick,
    /// playback call or capture call happens.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.stop_listening();
        self.poller.stop();
        self.torn_down = true;
        log::debug!("session: torn down after {} rounds", self.round);
    }

    // -----------------------------------------------------------------------
    // External events
    // -----------------------------------------------------------------------

    /// Fold recognized speech into the transcript while listening.
    pub fn on_recognition(&mut self, event: &RecognitionEvent) {
        let update = {
            let mut st = lock_state(&self.state);
            if !st.phase.is_listening() {
                log::trace!("session: recognition event ignored while idle");
                return;
            }
            st.transcript.apply(event).then(|| SessionUpdate::Transcript {
                finalized: st.transcript.finalized().to_string(),
                interim: st.transcript.interim().to_string(),
            })
        };

        if let Some(update) = update {
            self.notify(update);
        }
    }

    /// Record the latest classifier label while listening.
    pub fn on_emotion(&mut self, label: String) {
        let changed = {
            let mut st = lock_state(&self.state);
            if !st.phase.is_listening() {
                log::trace!("session: emotion ignored while idle");
                return;
            }
            st.emotion.set(label.as_str())
        };

        if changed {
            self.notify(SessionUpdate::Emotion(label));
        }
    }

    /// Apply the result of one advice request, in arrival order.
    pub fn on_delivery(&mut self, delivery: AdviceDelivery) {
        let AdviceDelivery { round, result } = delivery;
        let current = round == self.round && self.phase().is_listening();

        if !current && self.config.advisor.late_responses == LateResponsePolicy::Discard {
            log::debug!("session: discarding late response from round {round}");
            return;
        }

        let (appended, cleared_generating) = {
            let mut st = lock_state(&self.state);
            let appended = st.advice.record(&result).cloned();

            let is_advice = matches!(result, Ok(AdviceReply::Advice(_)));
            let cleared = is_advice && current && st.generating;
            if cleared {
                st.generating = false;
            }
            (appended, cleared)
        };

        if let Some(entry) = appended {
            self.notify(SessionUpdate::Advice(entry));
        }
        if cleared_generating {
            self.notify(SessionUpdate::Generating(false));
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn notify(&self, update: SessionUpdate) {
        if let Some(tx) = &self.updates {
            if tx.send(update).is_err() {
                log::trace!("session: update receiver gone");
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
