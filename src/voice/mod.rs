//! Voice playback gateway.
//!
//! The controller hands prompts to a [`VoicePlayback`] implementation and
//! never waits for completion: playback is fire-and-forget, with a
//! best-effort [`cancel`](VoicePlayback::cancel) when the round stops.
//!
//! Two request variants exist:
//!
//! | Variant                 | Source                                   |
//! |-------------------------|------------------------------------------|
//! | [`VoiceRequest::Speak`] | text synthesised by the playback engine  |
//! | [`VoiceRequest::Stream`]| fixed audio clip fetched from a URL      |

pub mod playback;

pub use playback::{SilentPlayback, VoicePlayback, VoiceRequest};
