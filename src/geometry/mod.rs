//! Geometry conversions between axis-aligned and oriented boxes.
//!
//! Everything here is pure and works in normalized image space. The
//! transforms mirror the three label formats:
//!
//! - [`box_to_quad`]: axis-aligned `(cx, cy, w, h)` to four corners, winding
//!   clockwise from the top-left corner.
//! - [`quad_to_box`]: four corners to the minimal enclosing axis-aligned box.
//!   This is lossy: any rotation of the quad is discarded. A box survives
//!   `box -> quad -> box` exactly (up to float rounding), but a rotated quad
//!   does not survive `quad -> box -> quad`.
//! - [`rotated_box_to_quad`]: `(cx, cy, w, h, angle)` to four corners, with
//!   `angle` in radians.
//!
//! The `*_to_obb` / `obb_to_detect` wrappers add the validation and
//! unit-square clamping that label conversion needs, and report when
//! clamping or rotation loss happened so callers can surface it.
//!
//! # Example
//!
//! ```
//! use yoloprep::geometry::{box_to_quad, quad_to_box, CxCyWh};
//!
//! let quad = box_to_quad(CxCyWh::new(0.5, 0.5, 0.2, 0.4)).unwrap();
//! let back = quad_to_box(&quad).unwrap();
//! assert!((back.w - 0.2).abs() < 1e-12);
//! ```

mod bbox;
mod point;
mod quad;

pub use bbox::CxCyWh;
pub use point::Point;
pub use quad::Quad;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Record-level geometry failures.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GeometryError {
    #[error("degenerate box: width {width} and height {height} must both be positive")]
    Degenerate { width: f64, height: f64 },

    #[error("non-finite value in {field}")]
    NonFinite { field: &'static str },

    #[error("box lies outside the image: nothing remains after clamping to [0, 1]")]
    OutOfRange,
}

/// A rotated box as `(cx, cy, w, h, angle)`, with `angle` in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RotatedBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    pub angle: f64,
}

impl RotatedBox {
    #[inline]
    pub fn new(cx: f64, cy: f64, w: f64, h: f64, angle: f64) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            angle,
        }
    }

    /// The unrotated box with the same centre and extents.
    #[inline]
    pub fn extent(&self) -> CxCyWh {
        CxCyWh::new(self.cx, self.cy, self.w, self.h)
    }
}

/// Result of a conversion, with the lossiness that occurred on the way.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Converted<T> {
    pub value: T,
    /// At least one coordinate was clamped into `[0, 1]`.
    pub clamped: bool,
    /// The source was rotated and the rotation was dropped.
    pub rotation_discarded: bool,
}

impl<T> Converted<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Converted<U> {
        Converted {
            value: f(self.value),
            clamped: self.clamped,
            rotation_discarded: self.rotation_discarded,
        }
    }
}

/// Corners of an axis-aligned box, clockwise from the top-left.
pub fn box_to_quad(b: CxCyWh) -> Result<Quad, GeometryError> {
    check_box(&b)?;
    let (xmin, ymin, xmax, ymax) = b.to_xyxy();
    Ok(Quad::new([
        Point::new(xmin, ymin),
        Point::new(xmax, ymin),
        Point::new(xmax, ymax),
        Point::new(xmin, ymax),
    ]))
}

/// Minimal axis-aligned box enclosing a quad. Lossy for rotated quads.
pub fn quad_to_box(q: &Quad) -> Result<CxCyWh, GeometryError> {
    if !q.is_finite() {
        return Err(GeometryError::NonFinite { field: "quad corner" });
    }
    let b = q.bounding_box();
    if !b.has_positive_extent() {
        return Err(GeometryError::Degenerate {
            width: b.w,
            height: b.h,
        });
    }
    Ok(b)
}

/// Corners of a rotated box, in the same winding as [`box_to_quad`] before
/// rotation.
///
/// The corner offsets `(±w/2, ±h/2)` are rotated by `[[cos, -sin], [sin, cos]]`
/// and translated to the centre.
pub fn rotated_box_to_quad(r: RotatedBox) -> Result<Quad, GeometryError> {
    check_box(&r.extent())?;
    if !r.angle.is_finite() {
        return Err(GeometryError::NonFinite { field: "angle" });
    }
    if r.angle == 0.0 {
        return box_to_quad(r.extent());
    }

    let (sin, cos) = r.angle.sin_cos();
    let half_w = r.w / 2.0;
    let half_h = r.h / 2.0;
    let offsets = [
        (-half_w, -half_h),
        (half_w, -half_h),
        (half_w, half_h),
        (-half_w, half_h),
    ];
    Ok(Quad::new(offsets.map(|(dx, dy)| {
        Point::new(r.cx + dx * cos - dy * sin, r.cy + dx * sin + dy * cos)
    })))
}

/// `detect -> obb` for one record: synthesize the (optionally rotated) quad
/// and clamp it into the image.
pub fn detect_to_obb(b: CxCyWh, angle: f64) -> Result<Converted<Quad>, GeometryError> {
    rotated_to_obb(RotatedBox::new(b.cx, b.cy, b.w, b.h, angle))
}

/// `xywhr -> obb` for one record.
pub fn rotated_to_obb(r: RotatedBox) -> Result<Converted<Quad>, GeometryError> {
    let quad = rotated_box_to_quad(r)?;
    let (value, clamped) = quad.clamp_unit();
    if !value.bounding_box().has_positive_extent() {
        return Err(GeometryError::OutOfRange);
    }
    Ok(Converted {
        value,
        clamped,
        rotation_discarded: false,
    })
}

/// `obb -> detect` for one record: bounding box, clipped to the image.
pub fn obb_to_detect(q: &Quad) -> Result<Converted<CxCyWh>, GeometryError> {
    let b = quad_to_box(q)?;
    let (value, clamped) = b.clamp_unit();
    if !value.has_positive_extent() {
        return Err(GeometryError::OutOfRange);
    }
    Ok(Converted {
        value,
        clamped,
        rotation_discarded: !q.is_axis_aligned(),
    })
}

fn check_box(b: &CxCyWh) -> Result<(), GeometryError> {
    if !b.is_finite() {
        return Err(GeometryError::NonFinite { field: "box" });
    }
    if !b.has_positive_extent() {
        return Err(GeometryError::Degenerate {
            width: b.w,
            height: b.h,
        });
    }
    Ok(())
}
