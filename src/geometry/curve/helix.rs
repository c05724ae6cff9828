use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A cylindrical helix: a circle of `radius` about `axis` that rises by
/// `pitch` per full turn.
#[derive(Debug, Clone)]
pub struct Helix {
    base: Point3,
    axis: Vector3,
    ref_dir: Vector3,
    radius: f64,
    pitch: f64,
}

impl Helix {
    /// Creates a new helix.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive or the frame is degenerate.
    pub fn new(base: Point3, axis: Vector3, ref_dir: Vector3, radius: f64, pitch: f64) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("helix radius must be positive".into()).into());
        }
        let axis_len = axis.norm();
        let ref_len = ref_dir.norm();
        if axis_len < TOLERANCE || ref_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            base,
            axis: axis / axis_len,
            ref_dir: ref_dir / ref_len,
            radius,
            pitch,
        })
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Curve for Helix {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let binormal = self.axis.cross(&self.ref_dir);
        let rise = self.pitch * t / std::f64::consts::TAU;
        Ok(self.base
            + self.ref_dir * (self.radius * t.cos())
            + binormal * (self.radius * t.sin())
            + self.axis * rise)
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::UNBOUNDED
    }
}
