use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

/// Single-shot cancellation signal shared between the owner and the polling worker.
///
/// Once cancelled it stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<Inner>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let mut cancelled = self.0.cancelled.lock();
        if !*cancelled {
            *cancelled = true;
            self.0.cond.notify_all();
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        *self.0.cancelled.lock()
    }

    /// Sleeps for `timeout` or until cancelled, whichever comes first.
    ///
    /// Returns `true` if the token was cancelled.
    pub fn sleep(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.0.cancelled.lock();

        while !*cancelled {
            if self.0.cond.wait_until(&mut cancelled, deadline).timed_out() {
                break;
            }
        }

        *cancelled
    }
}
