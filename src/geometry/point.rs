//! Normalized 2D points.

use serde::{Deserialize, Serialize};

/// A point in normalized image space, where `(0, 0)` is the top-left corner
/// and `(1, 1)` the bottom-right corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Clamps both coordinates into `[0, 1]`.
    ///
    /// The flag is true when either coordinate had to move.
    pub fn clamp_unit(self) -> (Self, bool) {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        let moved = x != self.x || y != self.y;
        (Self { x, y }, moved)
    }
}
