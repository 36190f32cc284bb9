use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::association::MotionModel;
use crate::error::{Error, Result};
use crate::filter::LabelFilter;
use crate::labels::{DEFAULT_MAX_MISSED_CYCLES, DEFAULT_STABILITY_THRESHOLD};

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.2;
pub const DEFAULT_MAX_FREQUENCY_HZ: f64 = 10.0;
pub const DEFAULT_CONFIRM_QUEUE_CAPACITY: usize = 64;

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_max_frequency_hz() -> f64 {
    DEFAULT_MAX_FREQUENCY_HZ
}

fn default_stability_threshold() -> u32 {
    DEFAULT_STABILITY_THRESHOLD
}

fn default_max_missed_cycles() -> u32 {
    DEFAULT_MAX_MISSED_CYCLES
}

fn default_confirm_queue_capacity() -> usize {
    DEFAULT_CONFIRM_QUEUE_CAPACITY
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    #[serde(default)]
    pub camera_name: String,
    #[serde(default)]
    pub detector_name: String,
    /// Class name to minimum confidence. Empty means every class passes.
    #[serde(default)]
    pub chosen_labels: HashMap<String, f64>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Upper bound on polling cycles per second, 0 disables the limit.
    #[serde(default = "default_max_frequency_hz")]
    pub max_frequency_hz: f64,
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,
    #[serde(default = "default_max_missed_cycles")]
    pub max_missed_cycles: u32,
    #[serde(default = "default_confirm_queue_capacity")]
    pub confirm_queue_capacity: usize,
    #[serde(default)]
    pub motion_prediction: bool,
}

impl TrackerConfig {
    pub fn new<S: Into<String>>(camera_name: S, detector_name: S) -> Self {
        Self {
            camera_name: camera_name.into(),
            detector_name: detector_name.into(),
            chosen_labels: HashMap::new(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            max_frequency_hz: DEFAULT_MAX_FREQUENCY_HZ,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            max_missed_cycles: DEFAULT_MAX_MISSED_CYCLES,
            confirm_queue_capacity: DEFAULT_CONFIRM_QUEUE_CAPACITY,
            motion_prediction: false,
        }
    }

    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera_name.is_empty() {
            return Err(Error::config(
                r#"expected "camera_name" attribute for object tracker"#,
            ));
        }

        if self.detector_name.is_empty() {
            return Err(Error::config(
                r#"expected "detector_name" attribute for object tracker"#,
            ));
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::config(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }

        for (label, conf) in &self.chosen_labels {
            if !(0.0..=1.0).contains(conf) {
                return Err(Error::config(format!(
                    "minimum confidence for {:?} must be in [0, 1], got {}",
                    label, conf
                )));
            }
        }

        if !self.max_frequency_hz.is_finite() || self.max_frequency_hz < 0.0 {
            return Err(Error::config(format!(
                "max_frequency_hz must be a non-negative number, got {}",
                self.max_frequency_hz
            )));
        }

        if self.max_frequency_hz > 0.0
            && Duration::try_from_secs_f64(1.0 / self.max_frequency_hz).is_err()
        {
            return Err(Error::config(format!(
                "max_frequency_hz {} gives a cycle period out of range",
                self.max_frequency_hz
            )));
        }

        if self.stability_threshold == 0 {
            return Err(Error::config("stability_threshold must be at least 1"));
        }

        if self.confirm_queue_capacity == 0 {
            return Err(Error::config("confirm_queue_capacity must be at least 1"));
        }

        Ok(())
    }

    /// Minimum time between cycle starts, `None` when unthrottled.
    ///
    /// A frequency too low to express as a period is rejected by
    /// [`validate`](Self::validate) and yields `None` here.
    pub fn cycle_period(&self) -> Option<Duration> {
        if self.max_frequency_hz > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.max_frequency_hz).ok()
        } else {
            None
        }
    }

    pub fn filter(&self) -> LabelFilter {
        LabelFilter::new(&self.chosen_labels, self.min_confidence)
    }

    pub fn motion_model(&self) -> MotionModel {
        if self.motion_prediction {
            MotionModel::Linear
        } else {
            MotionModel::Static
        }
    }
}
