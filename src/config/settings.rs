//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// OverlapPolicy
// ---------------------------------------------------------------------------

/// What the advice poller does when a tick fires while an earlier request is
/// still waiting for the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// Fire a new request on every tick, regardless of pending ones.
    Allow,
    /// Skip the tick entirely while any request is still pending.
    SkipWhileInFlight,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self::Allow
    }
}

// ---------------------------------------------------------------------------
// LateResponsePolicy
// ---------------------------------------------------------------------------

/// Whether a response from a listening round that has already been stopped
/// may still land in the advice log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LateResponsePolicy {
    /// Apply late responses like any other.
    Accept,
    /// Drop responses whose round is no longer the active one.
    Discard,
}

impl Default for LateResponsePolicy {
    fn default() -> Self {
        Self::Accept
    }
}

// ---------------------------------------------------------------------------
// AdvisorConfig
// ---------------------------------------------------------------------------

/// Settings for the advisory backend and the poll loop that feeds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Base URL of the backend (e.g. `http://localhost:5000`).
    pub base_url: String,
    /// Path of the advice endpoint, appended to `base_url`.
    pub advice_path: String,
    /// Maximum seconds to wait for a single advice response.
    pub timeout_secs: u64,
    /// Milliseconds between two poll ticks.
    pub poll_interval_ms: u64,
    /// Behaviour when ticks overlap with pending requests.
    pub overlap: OverlapPolicy,
    /// Behaviour for responses that arrive after their round was stopped.
    pub late_responses: LateResponsePolicy,
}

impl AdvisorConfig {
    /// Full URL of the advice endpoint.
    pub fn advice_url(&self) -> String {
        join_url(&self.base_url, &self.advice_path)
    }

    /// Poll cadence as a [`Duration`].
    ///
    /// A zero interval is bumped to one millisecond; `tokio::time::interval`
    /// panics on zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            advice_path: "/api/advice".into(),
            timeout_secs: 30,
            poll_interval_ms: 5_000,
            overlap: OverlapPolicy::default(),
            late_responses: LateResponsePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptConfig
// ---------------------------------------------------------------------------

/// The scripted conversation walked through one line per listening round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Prompt lines, spoken in order.
    pub lines: Vec<String>,
    /// Closing line repeated once every prompt has been used.
    pub terminal: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            lines: vec![
                "Welcome! Listening has started. Please speak now.".into(),
                "Tell me about a recent situation that made you feel stressed.".into(),
                "How did you respond in that moment?".into(),
                "What would you like to do differently next time?".into(),
            ],
            terminal: "That's the end of today's session. Thank you for sharing.".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// VoiceMode / VoiceConfig
// ---------------------------------------------------------------------------

/// How prompts are voiced when a listening round starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoiceMode {
    /// Synthesize the current prompt text locally.
    Synthesize,
    /// Stream the fixed audio clip served by the backend.
    Stream,
}

impl Default for VoiceMode {
    fn default() -> Self {
        Self::Synthesize
    }
}

/// Voice playback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Selected playback variant.
    pub mode: VoiceMode,
    /// Path of the audio endpoint used in [`VoiceMode::Stream`], appended to
    /// the advisor `base_url`.
    pub stream_path: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            mode: VoiceMode::default(),
            stream_path: "/api/tts".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// EmotionConfig
// ---------------------------------------------------------------------------

/// Settings for interpreting classifier output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionConfig {
    /// Prefix the classifier puts in front of the detected label.
    pub result_prefix: String,
}

impl Default for EmotionConfig {
    fn default() -> Self {
        Self {
            result_prefix: "Detected emotion: ".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_coach::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Advisory backend and poll loop.
    pub advisor: AdvisorConfig,
    /// Coaching script.
    pub script: ScriptConfig,
    /// Voice playback.
    pub voice: VoiceConfig,
    /// Classifier output parsing.
    pub emotion: EmotionConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Full URL of the streamed voice clip.
    pub fn stream_url(&self) -> String {
        join_url(&self.advisor.base_url, &self.voice.stream_path)
    }
}

/// Join a base URL and a path without doubling or dropping the slash.
fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
