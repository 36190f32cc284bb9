//! Identity assignment: naming new objects and carrying names across frames.

use chrono::{DateTime, Local};
use ndarray::ArrayView2;
use std::collections::HashMap;

use crate::association::{cost_matrix, MotionModel};
use crate::detection::Detection;
use crate::error::{Error, Result};
use crate::solver::AssignmentSolver;
use crate::store::History;
use crate::track::{Stability, Track};

pub const LABEL_DELIMITER: char = '_';
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M";

pub const DEFAULT_STABILITY_THRESHOLD: u32 = 3;
pub const DEFAULT_MAX_MISSED_CYCLES: u32 = 5;

/// Lowercased class name, i.e. the label up to the first delimiter.
pub fn base_class(label: &str) -> String {
    label
        .split(LABEL_DELIMITER)
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

#[inline]
pub fn timestamp(now: &DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// Outcome of one association cycle, partitioned so every track appears once.
#[derive(Debug, Default, Clone)]
pub struct Resolution {
    /// Matched, still below the stability threshold.
    pub tentative: Vec<Track>,
    /// Matched and crossed the stability threshold this cycle.
    pub newly_stable: Vec<Track>,
    /// Matched, already stable before this cycle.
    pub stable: Vec<Track>,
    /// Identities minted for unmatched detections.
    pub fresh: Vec<Track>,
    /// Unmatched previous tracks still within the miss limit.
    pub carried: Vec<Track>,
    /// Unmatched previous tracks dropped from the live set.
    pub expired: Vec<Track>,
}

impl Resolution {
    /// Tracks forming the next live generation.
    pub fn live(&self) -> Vec<Track> {
        self.tentative
            .iter()
            .chain(self.newly_stable.iter())
            .chain(self.stable.iter())
            .chain(self.fresh.iter())
            .chain(self.carried.iter())
            .cloned()
            .collect()
    }

    pub fn matched(&self) -> usize {
        self.tentative.len() + self.newly_stable.len() + self.stable.len()
    }
}

pub struct IdentityManager {
    class_counter: HashMap<String, u64>,
    live: Vec<Track>,
    history: History,
    stability_threshold: u32,
    max_missed_cycles: u32,
    motion: MotionModel,
}

impl IdentityManager {
    pub fn new(history: History) -> Self {
        Self {
            class_counter: HashMap::new(),
            live: Vec::new(),
            history,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            max_missed_cycles: DEFAULT_MAX_MISSED_CYCLES,
            motion: MotionModel::Static,
        }
    }

    /// Number of consecutive matches after which a track is stable. Values below 1 are raised to 1.
    pub fn with_stability_threshold(mut self, threshold: u32) -> Self {
        self.stability_threshold = threshold.max(1);
        self
    }

    /// Consecutive misses tolerated before a track leaves the live set.
    pub fn with_max_missed_cycles(mut self, max_missed: u32) -> Self {
        self.max_missed_cycles = max_missed;
        self
    }

    pub fn with_motion_model(mut self, motion: MotionModel) -> Self {
        self.motion = motion;
        self
    }

    #[inline]
    pub fn live(&self) -> &[Track] {
        &self.live
    }

    #[inline]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Next ordinal that would be minted for `class`.
    pub fn next_ordinal(&self, class: &str) -> u64 {
        self.class_counter
            .get(&class.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Gives `det` a brand new identity.
    ///
    /// Ordinals are never reused within the manager's lifetime, even after
    /// every track of the class has expired.
    pub fn mint(&mut self, det: &Detection, now: DateTime<Local>) -> Track {
        let class = base_class(&det.label);
        let counter = self.class_counter.entry(class.clone()).or_insert(0);
        let ordinal = *counter;
        *counter += 1;

        let tracking_label = format!("{}{}{}", class, LABEL_DELIMITER, ordinal);
        let label = format!("{}{}{}", tracking_label, LABEL_DELIMITER, timestamp(&now));

        log::debug!("new identity {} from {:?}", label, det.bbox);

        let track = Track::new(tracking_label, det.with_label(label), now);
        self.history.start(&track);

        track
    }

    /// Applies solver output to `previous`.
    ///
    /// Pairings whose cost is exactly zero have no overlap and are ignored.
    /// Detections left without a real match are minted in index order.
    pub fn resolve(
        &mut self,
        assignment: &[Option<usize>],
        costs: ArrayView2<'_, f64>,
        previous: &[Track],
        detections: &[Detection],
        now: DateTime<Local>,
    ) -> Result<Resolution> {
        let (rows, cols) = costs.dim();
        if rows != previous.len() || cols != detections.len() || assignment.len() != rows {
            return Err(Error::assignment(format!(
                "cost matrix is {}x{}, assignment has {} rows for {} tracks and {} detections",
                rows,
                cols,
                assignment.len(),
                previous.len(),
                detections.len()
            )));
        }

        let mut seen = vec![false; cols];
        for (i, j) in assignment.iter().enumerate() {
            if let Some(j) = *j {
                if j >= cols {
                    return Err(Error::assignment(format!(
                        "row {} assigned to column {} of {}",
                        i, j, cols
                    )));
                }
                if seen[j] {
                    return Err(Error::assignment(format!("column {} assigned twice", j)));
                }
                seen[j] = true;
            }
        }

        let mut consumed = vec![false; cols];
        let mut res = Resolution::default();

        for (i, (track, col)) in previous.iter().zip(assignment).enumerate() {
            let j = match *col {
                Some(j) if costs[[i, j]] != 0.0 => j,
                _ => {
                    let mut track = track.clone();
                    track.miss();

                    if track.misses > self.max_missed_cycles {
                        log::debug!("{} expired after {} misses", track.label(), track.misses);
                        res.expired.push(track);
                    } else {
                        res.carried.push(track);
                    }
                    continue;
                }
            };

            consumed[j] = true;

            let mut track = track.clone();
            track.observe(&detections[j]);
            let was_stable = track.is_stable();
            if track.persistence >= self.stability_threshold {
                track.stability = Stability::Stable;
            }
            self.history.append(&track);

            if was_stable {
                res.stable.push(track);
            } else if track.is_stable() {
                log::info!("{} confirmed", track.label());
                res.newly_stable.push(track);
            } else {
                res.tentative.push(track);
            }
        }

        for (j, det) in detections.iter().enumerate() {
            if !consumed[j] {
                res.fresh.push(self.mint(det, now));
            }
        }

        Ok(res)
    }

    /// Associates `detections` with the live set and makes the result the new live set.
    pub fn step(
        &mut self,
        detections: &[Detection],
        solver: &dyn AssignmentSolver,
        now: DateTime<Local>,
    ) -> Result<Resolution> {
        let costs = cost_matrix(&self.live, detections, self.motion);
        let assignment = solver.solve(costs.view())?;

        let previous = std::mem::take(&mut self.live);
        match self.resolve(&assignment, costs.view(), &previous, detections, now) {
            Ok(res) => {
                self.live = res.live();
                Ok(res)
            }
            Err(err) => {
                self.live = previous;
                Err(err)
            }
        }
    }
}
