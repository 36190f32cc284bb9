use chrono::{DateTime, Local};

use crate::bbox::BBox;
use crate::detection::Detection;

/// Once `Stable`, a track never goes back to `Tentative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stability {
    #[default]
    Tentative,
    Stable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// `<class>_<ordinal>`, the identity key.
    pub tracking_label: String,
    /// Detection as last observed, labelled `<class>_<ordinal>_<timestamp>`.
    pub detection: Detection,
    /// Consecutive successful matches, reset by a miss.
    pub persistence: u32,
    /// Consecutive cycles without a match.
    pub misses: u32,
    pub stability: Stability,
    pub created_at: DateTime<Local>,
    // box from the match before the latest one
    pub prev_bbox: Option<BBox>,
}

impl Track {
    pub fn new<S: Into<String>>(
        tracking_label: S,
        detection: Detection,
        created_at: DateTime<Local>,
    ) -> Self {
        Self {
            tracking_label: tracking_label.into(),
            detection,
            persistence: 0,
            misses: 0,
            stability: Stability::Tentative,
            created_at,
            prev_bbox: None,
        }
    }

    #[inline]
    pub fn bbox(&self) -> &BBox {
        &self.detection.bbox
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.detection.label
    }

    #[inline]
    pub fn is_stable(&self) -> bool {
        self.stability == Stability::Stable
    }

    /// Whether the track was matched in the cycle that produced it.
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.misses == 0
    }

    /// Takes over geometry and score of `det`, keeping the identity.
    pub(crate) fn observe(&mut self, det: &Detection) {
        self.prev_bbox = Some(self.detection.bbox);
        self.detection.bbox = det.bbox;
        self.detection.norm_bbox = det.norm_bbox;
        self.detection.score = det.score;
        self.persistence += 1;
        self.misses = 0;
    }

    pub(crate) fn miss(&mut self) {
        self.persistence = 0;
        self.misses += 1;
    }
}
