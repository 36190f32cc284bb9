use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

/// Integer pixel rectangle in left-top-right-bottom format.
///
/// `left`/`top` are inclusive, `right`/`bottom` exclusive, so the area of
/// `(0, 0, 10, 10)` is 100 pixels. Sizes are `i64` so that any pair of `i32`
/// corners has a representable width, height and area.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BBox([i32; 4]);

impl From<BBox> for [i32; 4] {
    fn from(bbox: BBox) -> Self {
        bbox.0
    }
}

impl From<[i32; 4]> for BBox {
    fn from(v: [i32; 4]) -> Self {
        BBox::ltrb(v[0], v[1], v[2], v[3])
    }
}

impl BBox {
    /// Corners are normalized so that `left <= right` and `top <= bottom`.
    #[inline]
    pub fn ltrb(l: i32, t: i32, r: i32, b: i32) -> Self {
        BBox([l.min(r), t.min(b), l.max(r), t.max(b)])
    }

    /// Right and bottom saturate at the `i32` range.
    #[inline]
    pub fn ltwh(l: i32, t: i32, w: i32, h: i32) -> Self {
        Self::ltrb(l, t, l.saturating_add(w), t.saturating_add(h))
    }

    /// Box of the given size centered at `center`, rounded to the pixel grid
    /// and clamped to the `i32` range.
    pub fn centered(center: na::Point2<f64>, w: i64, h: i64) -> Self {
        let l = (center.x - w as f64 / 2.0).round();
        let t = (center.y - h as f64 / 2.0).round();

        // float to int casts saturate
        Self::ltrb(
            l as i32,
            t as i32,
            (l + w as f64) as i32,
            (t + h as f64) as i32,
        )
    }

    #[inline]
    pub fn as_slice(&self) -> &[i32; 4] {
        &self.0
    }

    #[inline(always)]
    pub fn left(&self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> i32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> i32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> i32 {
        self.0[3]
    }

    #[inline(always)]
    pub fn width(&self) -> i64 {
        self.0[2] as i64 - self.0[0] as i64
    }

    #[inline(always)]
    pub fn height(&self) -> i64 {
        self.0[3] as i64 - self.0[1] as i64
    }

    /// Pixel count, zero for degenerate boxes. At most `(2^32 - 1)^2`.
    #[inline]
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width() as u64 * self.height() as u64
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    #[inline]
    pub fn center(&self) -> na::Point2<f64> {
        na::Point2::new(
            (self.left() as f64 + self.right() as f64) / 2.0,
            (self.top() as f64 + self.bottom() as f64) / 2.0,
        )
    }

    /// Overlapping region, `None` when the boxes do not share any pixel.
    pub fn intersect(&self, other: &BBox) -> Option<BBox> {
        let l = self.left().max(other.left());
        let t = self.top().max(other.top());
        let r = self.right().min(other.right());
        let b = self.bottom().min(other.bottom());

        if r <= l || b <= t {
            None
        } else {
            Some(BBox([l, t, r, b]))
        }
    }

    /// Intersection over union, in `[0, 1]`.
    pub fn iou(&self, other: &BBox) -> f64 {
        let inter = match self.intersect(other) {
            Some(inter) => inter.area(),
            None => return 0.0,
        };

        let union = self.area() as u128 + other.area() as u128 - inter as u128;

        inter as f64 / union as f64
    }
}

/// Bounding box in image-relative coordinates, `[x_min, y_min, x_max, y_max]` in `[0, 1]`.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct NormBox(pub [f64; 4]);

impl NormBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        NormBox([
            x_min.clamp(0.0, 1.0),
            y_min.clamp(0.0, 1.0),
            x_max.clamp(0.0, 1.0),
            y_max.clamp(0.0, 1.0),
        ])
    }

    /// Normalizes a pixel box against frame dimensions.
    pub fn from_pixels(bbox: &BBox, dims: (u32, u32)) -> Option<Self> {
        let (fw, fh) = dims;
        if fw == 0 || fh == 0 {
            return None;
        }

        let (fw, fh) = (fw as f64, fh as f64);

        Some(Self::new(
            bbox.left() as f64 / fw,
            bbox.top() as f64 / fh,
            bbox.right() as f64 / fw,
            bbox.bottom() as f64 / fh,
        ))
    }
}
