//! Four-corner oriented boxes.

use serde::{Deserialize, Serialize};

use super::{CxCyWh, Point};

const AXIS_EPSILON: f64 = 1e-9;

/// A quadrilateral given by its four corners, in label-file order.
///
/// Quads produced by this crate wind clockwise from the top-left corner in
/// image coordinates (y grows downwards). Quads read from label files keep
/// whatever order the file used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    /// Creates a quad from four corners.
    #[inline]
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Creates a quad from a flat `[x1, y1, ..., x4, y4]` array.
    pub fn from_flat(v: [f64; 8]) -> Self {
        Self::new([
            Point::new(v[0], v[1]),
            Point::new(v[2], v[3]),
            Point::new(v[4], v[5]),
            Point::new(v[6], v[7]),
        ])
    }

    /// Flattens the corners into `[x1, y1, ..., x4, y4]`.
    pub fn to_flat(&self) -> [f64; 8] {
        let p = &self.points;
        [
            p[0].x, p[0].y, p[1].x, p[1].y, p[2].x, p[2].y, p[3].x, p[3].y,
        ]
    }

    /// Returns true if all corners are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(Point::is_finite)
    }

    /// Minimal axis-aligned box enclosing the four corners.
    pub fn bounding_box(&self) -> CxCyWh {
        let (xmin, ymin, xmax, ymax) = self.points.iter().fold(
            (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |(xmin, ymin, xmax, ymax), p| (xmin.min(p.x), ymin.min(p.y), xmax.max(p.x), ymax.max(p.y)),
        );
        CxCyWh::from_xyxy(xmin, ymin, xmax, ymax)
    }

    /// Polygon area by the shoelace formula (always non-negative).
    pub fn area(&self) -> f64 {
        let p = &self.points;
        let twice: f64 = (0..4)
            .map(|i| {
                let a = p[i];
                let b = p[(i + 1) % 4];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice.abs() / 2.0
    }

    /// True when every edge is horizontal or vertical, i.e. reducing the
    /// quad to its bounding box loses no rotation.
    pub fn is_axis_aligned(&self) -> bool {
        let p = &self.points;
        (0..4).all(|i| {
            let a = p[i];
            let b = p[(i + 1) % 4];
            (a.x - b.x).abs() <= AXIS_EPSILON || (a.y - b.y).abs() <= AXIS_EPSILON
        })
    }

    /// Clamps every corner into the unit square.
    pub fn clamp_unit(self) -> (Self, bool) {
        let mut moved = false;
        let points = self.points.map(|p| {
            let (p, m) = p.clamp_unit();
            moved |= m;
            p
        });
        (Self { points }, moved)
    }
}
