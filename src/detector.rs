use crate::cancel::CancelToken;
use crate::detection::Detection;
use crate::error::Result;
use crate::frame::Frame;

/// Per-frame object detector.
///
/// Shared between the polling worker and one-shot serving calls, hence `Sync`.
pub trait Detector: Send + Sync {
    /// Runs inference on `frame`.
    ///
    /// Failures are fatal to the current polling cycle. Long-running
    /// implementations may return `Error::Cancelled` once `cancel` fires.
    fn detect(&self, frame: &Frame, cancel: &CancelToken) -> Result<Vec<Detection>>;
}

impl<F> Detector for F
where
    F: Fn(&Frame) -> Result<Vec<Detection>> + Send + Sync,
{
    fn detect(&self, frame: &Frame, _cancel: &CancelToken) -> Result<Vec<Detection>> {
        self(frame)
    }
}
