//! `VoicePlayback` trait and the no-audio fallback.

use crate::config::{AppConfig, VoiceMode};

/// What to play when a listening round starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceRequest {
    /// Synthesize this line of text.
    Speak(String),
    /// Stream the audio clip at this URL.
    Stream(String),
}

impl VoiceRequest {
    /// Build the request for `line` according to the configured voice mode.
    pub fn for_line(config: &AppConfig, line: &str) -> Self {
        match config.voice.mode {
            VoiceMode::Synthesize => VoiceRequest::Speak(line.to_string()),
            VoiceMode::Stream => VoiceRequest::Stream(config.stream_url()),
        }
    }
}

/// Object-safe, thread-safe playback interface.
///
/// Both methods return immediately.  `cancel` must be safe to call when
/// nothing is playing.
pub trait VoicePlayback: Send + Sync {
    fn play(&self, request: VoiceRequest);
    fn cancel(&self);
}

// Compile-time assertion: Box<dyn VoicePlayback> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn VoicePlayback>) {}
};

/// Playback used when no speech output is available.
///
/// Logs what would have been played and otherwise does nothing, so the
/// session runs unchanged without audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayback;

impl VoicePlayback for SilentPlayback {
    fn play(&self, request: VoiceRequest) {
        match request {
            VoiceRequest::Speak(text) => log::info!("voice: (silent) {text}"),
            VoiceRequest::Stream(url) => log::info!("voice: (silent) stream {url}"),
        }
    }

    fn cancel(&self) {
        log::trace!("voice: (silent) cancel");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesize_mode_speaks_the_line() {
        let config = AppConfig::default();
        assert_eq!(
            VoiceRequest::for_line(&config, "Welcome!"),
            VoiceRequest::Speak("Welcome!".into())
        );
    }

    #[test]
    fn stream_mode_ignores_the_line() {
        let mut config = AppConfig::default();
        config.voice.mode = VoiceMode::Stream;
        assert_eq!(
            VoiceRequest::for_line(&config, "Welcome!"),
            VoiceRequest::Stream("http://localhost:5000/api/tts".into())
        );
    }

    #[test]
    fn silent_playback_accepts_everything() {
        let playback: Box<dyn VoicePlayback> = Box::new(SilentPlayback);
        playback.cancel();
        playback.play(VoiceRequest::Speak("hello".into()));
        playback.cancel();
    }
}
