use std::collections::HashMap;

use crate::detection::Detection;

/// Class allow-list with per-class and global confidence floors.
#[derive(Debug, Clone, Default)]
pub struct LabelFilter {
    chosen_labels: HashMap<String, f64>,
    min_confidence: f64,
}

impl LabelFilter {
    /// `chosen_labels` keys are matched case-insensitively.
    pub fn new(chosen_labels: &HashMap<String, f64>, min_confidence: f64) -> Self {
        Self {
            chosen_labels: chosen_labels
                .iter()
                .map(|(k, v)| (k.to_lowercase(), *v))
                .collect(),
            min_confidence,
        }
    }

    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.chosen_labels.is_empty()
    }

    pub fn accepts(&self, det: &Detection) -> bool {
        match self.chosen_labels.get(&det.label.to_lowercase()) {
            Some(min_conf) => det.score > *min_conf && det.score > self.min_confidence,
            None => false,
        }
    }

    /// Keeps the accepted detections in their original order.
    ///
    /// An empty allow-list returns the input untouched.
    pub fn apply(&self, detections: Vec<Detection>) -> Vec<Detection> {
        if self.is_passthrough() {
            return detections;
        }

        detections.into_iter().filter(|d| self.accepts(d)).collect()
    }
}
