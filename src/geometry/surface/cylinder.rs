use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A cylindrical surface about an axis through `center`.
///
/// `P(u, v) = center + radius * (cos(u) * ref_dir + sin(u) * binormal) + v * axis`
/// with `binormal = axis x ref_dir`. The parametric normal points away from
/// the axis.
#[derive(Debug, Clone)]
pub struct Cylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    ref_dir: Vector3,
}

impl Cylinder {
    /// Creates a new cylinder.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is non-positive, the axis is zero-length,
    /// or the reference direction is not perpendicular to the axis.
    pub fn new(center: Point3, radius: f64, axis: Vector3, ref_dir: Vector3) -> Result<Self> {
        if radius < TOLERANCE {
            return Err(GeometryError::Degenerate("cylinder radius must be positive".into()).into());
        }
        let axis_len = axis.norm();
        let ref_len = ref_dir.norm();
        if axis_len < TOLERANCE || ref_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let axis = axis / axis_len;
        let ref_dir = ref_dir / ref_len;
        if axis.dot(&ref_dir).abs() > 1e-9 {
            return Err(GeometryError::Degenerate(
                "reference direction must be perpendicular to axis".into(),
            )
            .into());
        }
        Ok(Self {
            center,
            radius,
            axis,
            ref_dir,
        })
    }

    /// Returns the point on the axis where `v = 0`.
    #[must_use]
    pub fn center(&self) -> &Point3 {
        &self.center
    }

    /// Returns the radius.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Returns the unit axis direction.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the reference direction (u = 0).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Returns the outward radial direction at the projection of `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if the point lies on the axis.
    pub fn radial_at(&self, point: &Point3) -> Result<Vector3> {
        let d = point - self.center;
        let radial = d - self.axis * d.dot(&self.axis);
        let len = radial.norm();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate("point lies on cylinder axis".into()).into());
        }
        Ok(radial / len)
    }

    /// Computes `(u, v)` for a point on the surface; `u` is in `(-pi, pi]`.
    #[must_use]
    pub fn inverse(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.center;
        let binormal = self.axis.cross(&self.ref_dir);
        (d.dot(&binormal).atan2(d.dot(&self.ref_dir)), d.dot(&self.axis))
    }
}

impl Surface for Cylinder {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let binormal = self.axis.cross(&self.ref_dir);
        Ok(self.center
            + self.ref_dir * (self.radius * u.cos())
            + binormal * (self.radius * u.sin())
            + self.axis * v)
    }

    fn normal(&self, u: f64, _v: f64) -> Result<Vector3> {
        let binormal = self.axis.cross(&self.ref_dir);
        Ok(self.ref_dir * u.cos() + binormal * u.sin())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, std::f64::consts::TAU, f64::NEG_INFINITY, f64::INFINITY)
    }
}
