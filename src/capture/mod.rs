//! Speech capture lifecycle.
//!
//! The recognition engine itself lives outside this crate.  The controller
//! only acquires it when a listening round starts and releases it when the
//! round ends; recognized fragments arrive separately as
//! [`RecognitionEvent`](crate::transcript::RecognitionEvent)s through the
//! session handle.
//!
//! An engine that is missing on this platform reports
//! [`CaptureError::Unsupported`]; the session carries on as if nobody spoke.

use thiserror::Error;

/// Errors that can arise when acquiring speech capture.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    /// No recognition engine is available in this environment.
    #[error("speech recognition is not supported in this environment")]
    Unsupported,

    /// The engine exists but could not be started.
    #[error("speech capture failed: {0}")]
    Device(String),
}

/// Start/stop handle for an external continuous recognition session.
pub trait SpeechCapture: Send + Sync {
    fn start(&self) -> Result<(), CaptureError>;
    /// Release the recognition session.  Must be safe to call repeatedly.
    fn stop(&self);
}

/// Capture for environments without a recognition engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeechCapture;

impl SpeechCapture for NoSpeechCapture {
    fn start(&self) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported)
    }

    fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_capture_reports_unsupported() {
        let capture: Box<dyn SpeechCapture> = Box::new(NoSpeechCapture);
        assert!(matches!(capture.start(), Err(CaptureError::Unsupported)));
        capture.stop();
        capture.stop();
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            CaptureError::Device("mic busy".into()).to_string(),
            "speech capture failed: mic busy"
        );
    }
}
