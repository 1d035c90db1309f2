//! Axis-aligned boxes in YOLO centre format.

use serde::{Deserialize, Serialize};

/// An axis-aligned box as `(cx, cy, w, h)` in normalized coordinates.
///
/// Like the rest of the label model this type does not enforce positive
/// extents on construction; the conversion functions in
/// [`geometry`](super) reject degenerate boxes instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CxCyWh {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl CxCyWh {
    /// Creates a box from its centre and extents.
    #[inline]
    pub fn new(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self { cx, cy, w, h }
    }

    /// Creates a box from its min and max corners.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            cx: (xmin + xmax) / 2.0,
            cy: (ymin + ymax) / 2.0,
            w: xmax - xmin,
            h: ymax - ymin,
        }
    }

    /// Returns `(xmin, ymin, xmax, ymax)`.
    #[inline]
    pub fn to_xyxy(&self) -> (f64, f64, f64, f64) {
        let half_w = self.w / 2.0;
        let half_h = self.h / 2.0;
        (
            self.cx - half_w,
            self.cy - half_h,
            self.cx + half_w,
            self.cy + half_h,
        )
    }

    /// Returns the area of the box.
    ///
    /// May be negative if the box is malformed.
    #[inline]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Returns true if all fields are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Returns true if both extents are strictly positive.
    #[inline]
    pub fn has_positive_extent(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Clips the box edges to the unit square.
    ///
    /// The flag is true when any edge had to move. A box lying entirely
    /// outside the unit square comes back with a non-positive extent.
    pub fn clamp_unit(self) -> (Self, bool) {
        let (xmin, ymin, xmax, ymax) = self.to_xyxy();
        let clipped = (
            xmin.clamp(0.0, 1.0),
            ymin.clamp(0.0, 1.0),
            xmax.clamp(0.0, 1.0),
            ymax.clamp(0.0, 1.0),
        );
        if clipped == (xmin, ymin, xmax, ymax) {
            return (self, false);
        }
        let (xmin, ymin, xmax, ymax) = clipped;
        (Self::from_xyxy(xmin, ymin, xmax, ymax), true)
    }
}
