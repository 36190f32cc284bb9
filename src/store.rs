use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::track::Track;

/// Per-identity snapshots, keyed by tracking label, oldest first.
pub type HistoryMap = HashMap<String, Vec<Track>>;

/// Shared handle to the history map.
///
/// Only the polling worker writes; diagnostics read through the store.
#[derive(Debug, Clone, Default)]
pub struct History(Arc<RwLock<HistoryMap>>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start(&self, track: &Track) {
        self.0
            .write()
            .insert(track.tracking_label.clone(), vec![track.clone()]);
    }

    pub(crate) fn append(&self, track: &Track) {
        self.0
            .write()
            .entry(track.tracking_label.clone())
            .or_default()
            .push(track.clone());
    }

    pub fn get(&self, tracking_label: &str) -> Option<Vec<Track>> {
        self.0.read().get(tracking_label).cloned()
    }

    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<_> = self.0.read().keys().cloned().collect();
        labels.sort();
        labels
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

/// Previous and current generation of the live track set, published together.
#[derive(Debug, Clone)]
pub struct Generations {
    /// Number of publications so far; 0 before the first cycle.
    pub seq: u64,
    pub previous: Arc<[Track]>,
    pub current: Arc<[Track]>,
}

impl Default for Generations {
    fn default() -> Self {
        Self {
            seq: 0,
            previous: Vec::<Track>::new().into(),
            current: Vec::<Track>::new().into(),
        }
    }
}

pub struct TrackStore {
    generations: RwLock<Arc<Generations>>,
    history: History,
}

impl TrackStore {
    pub fn new(history: History) -> Self {
        Self {
            generations: RwLock::new(Arc::new(Generations::default())),
            history,
        }
    }

    /// Makes `current` the new current generation, demoting the old one to previous.
    ///
    /// Returns the sequence number of the publication.
    pub fn publish(&self, current: Vec<Track>) -> u64 {
        let mut guard = self.generations.write();
        let next = Generations {
            seq: guard.seq + 1,
            previous: guard.current.clone(),
            current: current.into(),
        };
        let seq = next.seq;
        *guard = Arc::new(next);

        seq
    }

    #[inline]
    pub fn snapshot(&self) -> Arc<Generations> {
        self.generations.read().clone()
    }

    #[inline]
    pub fn current(&self) -> Arc<[Track]> {
        self.generations.read().current.clone()
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }
}

impl Default for TrackStore {
    fn default() -> Self {
        Self::new(History::new())
    }
}
