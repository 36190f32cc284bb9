use chrono::{DateTime, Local};
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::Result;

/// One image pulled from a frame source.
///
/// The pixel payload is opaque to the tracker; only the detector looks at it.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub dims: (u32, u32),
    pub data: Arc<[u8]>,
    pub captured_at: DateTime<Local>,
}

impl Frame {
    pub fn new(seq: u64, dims: (u32, u32), data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            seq,
            dims,
            data: data.into(),
            captured_at: Local::now(),
        }
    }

    /// Frame without pixel data, useful for sources that hand detections through out of band.
    pub fn empty(seq: u64, dims: (u32, u32)) -> Self {
        Self::new(seq, dims, Vec::<u8>::new())
    }
}

/// Pull-based producer of frames, e.g. a camera stream.
///
/// Errors are fatal to the polling worker; sources are not retried.
pub trait FrameSource: Send {
    /// Blocks until the next frame is available.
    ///
    /// Implementations that can block for long should watch `cancel` and
    /// return [`Error::Cancelled`](crate::error::Error::Cancelled) once it fires.
    fn next_frame(&mut self, cancel: &CancelToken) -> Result<Frame>;

    /// Releases the underlying stream. Called exactly once by the worker when it exits.
    fn release(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self, cancel: &CancelToken) -> Result<Frame> {
        (**self).next_frame(cancel)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
