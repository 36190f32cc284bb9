use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::cancel::CancelToken;
use crate::config::TrackerConfig;
use crate::detection::Detection;
use crate::detector::Detector;
use crate::error::{Error, Result};
use crate::filter::LabelFilter;
use crate::frame::{Frame, FrameSource};
use crate::labels::IdentityManager;
use crate::poller::{Pipeline, Poller, Shared};
use crate::solver::{AssignmentSolver, MunkresSolver};
use crate::stats::CycleStats;
use crate::store::{Generations, History, TrackStore};
use crate::track::Track;

/// Object tracker service: owns the polling worker and serves its results.
///
/// All reads go through the last published generation and never wait on the
/// worker. Dropping the tracker cancels and joins the worker.
pub struct ObjectTracker {
    config: TrackerConfig,
    detector: Arc<dyn Detector>,
    filter: LabelFilter,
    shared: Arc<Shared>,
    cancel: CancelToken,
    worker: Option<JoinHandle<Result<()>>>,
}

impl ObjectTracker {
    /// Validates `config` and starts polling `source` with the default solver.
    pub fn new<S>(config: TrackerConfig, source: S, detector: Arc<dyn Detector>) -> Result<Self>
    where
        S: FrameSource + 'static,
    {
        Self::with_solver(config, source, detector, MunkresSolver)
    }

    pub fn with_solver<S, A>(
        config: TrackerConfig,
        source: S,
        detector: Arc<dyn Detector>,
        solver: A,
    ) -> Result<Self>
    where
        S: FrameSource + 'static,
        A: AssignmentSolver + 'static,
    {
        config.validate()?;

        let history = History::new();
        let manager = IdentityManager::new(history.clone())
            .with_stability_threshold(config.stability_threshold)
            .with_max_missed_cycles(config.max_missed_cycles)
            .with_motion_model(config.motion_model());

        let shared = Arc::new(Shared::new(
            TrackStore::new(history),
            config.confirm_queue_capacity,
        ));
        let cancel = CancelToken::new();
        let filter = config.filter();

        let pipeline = Pipeline {
            detector: detector.clone(),
            filter: filter.clone(),
            manager,
            solver: Box::new(solver),
        };
        let poller = Poller::new(
            source,
            pipeline,
            shared.clone(),
            config.cycle_period(),
            cancel.clone(),
        );

        log::info!(
            "starting object tracker on camera {:?} with detector {:?}",
            config.camera_name,
            config.detector_name
        );

        let worker = thread::Builder::new()
            .name(format!("idtrack-{}", config.camera_name))
            .spawn(move || poller.run())?;

        Ok(Self {
            config,
            detector,
            filter,
            shared,
            cancel,
            worker: Some(worker),
        })
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Detections of the latest generation that were matched or minted in its cycle.
    pub fn current_tracked(&self) -> Vec<Detection> {
        self.shared
            .store
            .current()
            .iter()
            .filter(|t| t.is_observed())
            .map(|t| t.detection.clone())
            .collect()
    }

    /// Every live track of the latest generation, including ones coasting through misses.
    pub fn current_tracks(&self) -> Arc<[Track]> {
        self.shared.store.current()
    }

    pub fn generations(&self) -> Arc<Generations> {
        self.shared.store.snapshot()
    }

    /// Identities confirmed since the last call, oldest first. Never blocks.
    pub fn drain_confirmed(&self) -> Vec<Detection> {
        self.shared.confirmed.drain()
    }

    /// Confirmations lost to the drop-oldest policy so far.
    pub fn dropped_confirmations(&self) -> u64 {
        self.shared.confirmed.evicted()
    }

    pub fn stats(&self) -> CycleStats {
        *self.shared.stats.lock()
    }

    /// Full snapshot history of one identity.
    pub fn history(&self, tracking_label: &str) -> Option<Vec<Track>> {
        self.shared.store.history().get(tracking_label)
    }

    /// Every tracking label minted so far, sorted.
    pub fn tracking_labels(&self) -> Vec<String> {
        self.shared.store.history().labels()
    }

    /// One-shot detection on a caller supplied frame, filtered but not tracked.
    pub fn detections(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let detections = self.detector.detect(frame, &self.cancel)?;

        Ok(self.filter.apply(detections))
    }

    /// Latest tracked detections for the configured camera.
    pub fn detections_from_camera(&self, camera_name: &str) -> Result<Vec<Detection>> {
        if camera_name != self.config.camera_name {
            return Err(Error::config(format!(
                "object tracker is bound to camera {:?}, not {:?}",
                self.config.camera_name, camera_name
            )));
        }

        Ok(self.current_tracked())
    }

    /// Whether the worker is still polling.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| !w.is_finished())
            .unwrap_or(false)
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Returns the error that terminated the worker, if it did not stop cleanly.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.cancel.cancel();

        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| Error::WorkerPanicked)?,
            None => Ok(()),
        }
    }
}

impl Drop for ObjectTracker {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::warn!("object tracker worker ended with error: {}", err);
        }
    }
}
