use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, NormBox};

/// Single object reported by a detector for one frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm_bbox: Option<NormBox>,
    pub label: String,
    #[serde(rename = "p")]
    pub score: f64,
}

impl Detection {
    pub fn new<S: Into<String>>(bbox: BBox, score: f64, label: S) -> Self {
        Self {
            bbox,
            norm_bbox: None,
            label: label.into(),
            score: score.clamp(0.0, 1.0),
        }
    }

    #[inline]
    pub fn with_norm_bbox(mut self, norm_bbox: NormBox) -> Self {
        self.norm_bbox = Some(norm_bbox);
        self
    }

    /// Copy of this detection carrying a different label.
    #[inline]
    pub fn with_label<S: Into<String>>(&self, label: S) -> Self {
        Self {
            bbox: self.bbox,
            norm_bbox: self.norm_bbox,
            label: label.into(),
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_label_keeps_geometry() {
        let det = Detection::new(BBox::ltrb(1, 2, 3, 4), 0.7, "Car")
            .with_norm_bbox(NormBox::new(0.1, 0.2, 0.3, 0.4));
        let renamed = det.with_label("car_0_20240101_1200");

        assert_eq!(renamed.bbox, det.bbox);
        assert_eq!(renamed.norm_bbox, det.norm_bbox);
        assert_eq!(renamed.score, det.score);
        assert_eq!(det.label, "Car");
        assert_eq!(renamed.label, "car_0_20240101_1200");
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(Detection::new(BBox::default(), 1.5, "x").score, 1.0);
        assert_eq!(Detection::new(BBox::default(), -0.5, "x").score, 0.0);
    }

    #[test]
    fn test_json_shape() {
        let det = Detection::new(BBox::ltrb(0, 0, 10, 10), 0.5, "dog");
        let json = serde_json::to_string(&det).unwrap();
        assert_eq!(json, r#"{"bbox":[0,0,10,10],"label":"dog","p":0.5}"#);

        let back: Detection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, det);
    }
}
