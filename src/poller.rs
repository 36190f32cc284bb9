//! Background polling loop: frame → detect → filter → associate → publish.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bbox::NormBox;
use crate::cancel::CancelToken;
use crate::detection::Detection;
use crate::detector::Detector;
use crate::error::Result;
use crate::filter::LabelFilter;
use crate::frame::FrameSource;
use crate::labels::{IdentityManager, Resolution};
use crate::queue::ConfirmQueue;
use crate::solver::AssignmentSolver;
use crate::stats::CycleStats;
use crate::store::TrackStore;

/// State the worker publishes and the serving side reads.
pub struct Shared {
    pub store: TrackStore,
    pub confirmed: ConfirmQueue<Detection>,
    pub stats: Mutex<CycleStats>,
}

impl Shared {
    pub fn new(store: TrackStore, confirm_capacity: usize) -> Self {
        Self {
            store,
            confirmed: ConfirmQueue::bounded(confirm_capacity),
            stats: Mutex::new(CycleStats::new()),
        }
    }
}

/// Per-frame processing stages, from raw detection to resolved identities.
pub struct Pipeline {
    pub detector: Arc<dyn Detector>,
    pub filter: LabelFilter,
    pub manager: IdentityManager,
    pub solver: Box<dyn AssignmentSolver>,
}

pub struct Poller<S: FrameSource> {
    source: S,
    pipeline: Pipeline,
    shared: Arc<Shared>,
    period: Option<Duration>,
    cancel: CancelToken,
}

impl<S: FrameSource> Poller<S> {
    /// `period` is the minimum time between cycle starts, `None` to poll flat out.
    pub fn new(
        source: S,
        pipeline: Pipeline,
        shared: Arc<Shared>,
        period: Option<Duration>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            source,
            pipeline,
            shared,
            period,
            cancel,
        }
    }

    /// Polls until cancelled or a cycle fails, then releases the frame source.
    ///
    /// Cancellation is a clean exit; any other error is returned.
    pub fn run(mut self) -> Result<()> {
        log::info!("polling started, period {:?}", self.period);

        let res = self.poll();
        self.source.release();

        match res {
            Err(err) if !err.is_cancelled() => {
                log::error!("polling aborted: {}", err);
                Err(err)
            }
            _ => {
                log::info!("polling stopped");
                Ok(())
            }
        }
    }

    fn poll(&mut self) -> Result<()> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let started = Instant::now();
            self.cycle()?;
            let elapsed = started.elapsed();
            self.shared.stats.lock().push(elapsed);

            // no catch-up when a cycle overruns its budget
            if let Some(rest) = self.period.and_then(|p| p.checked_sub(elapsed)) {
                if self.cancel.sleep(rest) {
                    return Ok(());
                }
            }
        }
    }

    /// Runs one frame through the pipeline and publishes the resulting generation.
    pub fn cycle(&mut self) -> Result<Resolution> {
        let frame = self.source.next_frame(&self.cancel)?;
        let raw = self.pipeline.detector.detect(&frame, &self.cancel)?;
        let total = raw.len();

        let detections: Vec<Detection> = self
            .pipeline
            .filter
            .apply(raw)
            .into_iter()
            .map(|det| match (det.norm_bbox, NormBox::from_pixels(&det.bbox, frame.dims)) {
                (None, Some(norm)) => det.with_norm_bbox(norm),
                _ => det,
            })
            .collect();

        let Pipeline { manager, solver, .. } = &mut self.pipeline;
        let res = manager.step(&detections, solver.as_ref(), frame.captured_at)?;

        let seq = self.shared.store.publish(manager.live().to_vec());

        for track in &res.newly_stable {
            let dropped = self.shared.confirmed.push(track.detection.clone());
            if dropped > 0 {
                log::warn!(
                    "confirmation queue full, dropped {} oldest before {}",
                    dropped,
                    track.label()
                );
            }
        }

        log::debug!(
            "frame {} gen {}: {}/{} detections, {} matched, {} fresh, {} confirmed, {} expired",
            frame.seq,
            seq,
            detections.len(),
            total,
            res.matched(),
            res.fresh.len(),
            res.newly_stable.len(),
            res.expired.len()
        );

        Ok(res)
    }

    #[inline]
    pub fn manager(&self) -> &IdentityManager {
        &self.pipeline.manager
    }
}
