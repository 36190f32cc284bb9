use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};

/// Bounded queue of newly confirmed identities.
///
/// The producer never blocks: when the queue is full the oldest pending item
/// is evicted to make room for the new one.
pub struct ConfirmQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    evicted: AtomicU64,
}

impl<T> ConfirmQueue<T> {
    /// `capacity` is raised to 1 if zero.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));

        Self {
            tx,
            rx,
            evicted: AtomicU64::new(0),
        }
    }

    /// Enqueues `item`, returning how many old items had to be dropped.
    pub fn push(&self, mut item: T) -> usize {
        let mut dropped = 0;

        loop {
            match self.tx.try_send(item) {
                Ok(()) => break,
                Err(TrySendError::Full(back)) => {
                    item = back;
                    if self.rx.try_recv().is_ok() {
                        dropped += 1;
                    }
                }
                // both ends live in `self`
                Err(TrySendError::Disconnected(_)) => unreachable!(),
            }
        }

        self.evicted.fetch_add(dropped as u64, Ordering::Relaxed);
        dropped
    }

    /// Takes everything currently queued without blocking, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }

    /// Total items dropped by the drop-oldest policy.
    #[inline]
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}
