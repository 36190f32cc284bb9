//! Geometric cost model between the live track set and a frame's detections.

use nalgebra as na;
use ndarray::Array2;

use crate::bbox::BBox;
use crate::detection::Detection;
use crate::track::Track;

/// Which box stands in for a track on the "old" side of the cost matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionModel {
    /// Box from the latest match.
    #[default]
    Static,
    /// Latest box shifted by the center velocity between the last two matches.
    Linear,
}

/// Extrapolates the box one frame ahead assuming constant center velocity.
///
/// Width and height are kept from `curr`.
pub fn predict_next(prev: &BBox, curr: &BBox) -> BBox {
    let vel: na::Vector2<f64> = curr.center() - prev.center();
    let next = curr.center() + vel;

    BBox::centered(next, curr.width(), curr.height())
}

impl MotionModel {
    pub fn reference_box(&self, track: &Track) -> BBox {
        match (self, track.prev_bbox) {
            (MotionModel::Linear, Some(prev)) => predict_next(&prev, track.bbox()),
            _ => *track.bbox(),
        }
    }
}

/// `tracks.len() x detections.len()` matrix of `-IOU`.
///
/// A cell is exactly zero when the two boxes share no pixel.
pub fn cost_matrix(tracks: &[Track], detections: &[Detection], model: MotionModel) -> Array2<f64> {
    let refs: Vec<BBox> = tracks.iter().map(|t| model.reference_box(t)).collect();

    Array2::from_shape_fn((tracks.len(), detections.len()), |(r, c)| {
        let iou = refs[r].iou(&detections[c].bbox);
        if iou > 0.0 {
            -iou
        } else {
            0.0
        }
    })
}
