use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// A conical surface with apex, axis and half-angle.
///
/// `P(u, v) = apex + v * (cos(a) * axis + sin(a) * (cos(u) * ref_dir + sin(u) * binormal))`
/// where `v >= 0` is the distance from the apex along a generator.
/// The parametric normal points away from the axis.
#[derive(Debug, Clone)]
pub struct Cone {
    apex: Point3,
    axis: Vector3,
    half_angle: f64,
    ref_dir: Vector3,
}

impl Cone {
    /// Creates a new cone.
    ///
    /// # Errors
    ///
    /// Returns an error if the half-angle is outside `(0, pi/2)`, the axis is
    /// zero-length, or the reference direction is not perpendicular to it.
    pub fn new(apex: Point3, axis: Vector3, half_angle: f64, ref_dir: Vector3) -> Result<Self> {
        if half_angle <= TOLERANCE || half_angle >= std::f64::consts::FRAC_PI_2 - TOLERANCE {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "half_angle",
                value: half_angle,
                min: 0.0,
                max: std::f64::consts::FRAC_PI_2,
            }
            .into());
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
            apex,
            axis,
            half_angle,
            ref_dir,
        })
    }

    /// Returns the apex point.
    #[must_use]
    pub fn apex(&self) -> &Point3 {
        &self.apex
    }

    /// Returns the unit axis direction (apex towards the opening).
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// Returns the half-angle in radians.
    #[must_use]
    pub fn half_angle(&self) -> f64 {
        self.half_angle
    }

    /// Returns the reference direction (u = 0).
    #[must_use]
    pub fn ref_dir(&self) -> &Vector3 {
        &self.ref_dir
    }

    /// Computes the outward normal at the projection of `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if the point lies on the axis (including the apex).
    pub fn normal_at_point(&self, point: &Point3) -> Result<Vector3> {
        let d = point - self.apex;
        let radial = d - self.axis * d.dot(&self.axis);
        let len = radial.norm();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate("cone normal is singular on the axis".into()).into());
        }
        let radial = radial / len;
        Ok(radial * self.half_angle.cos() - self.axis * self.half_angle.sin())
    }

    /// Computes `(u, v)` for a point on the surface.
    #[must_use]
    pub fn inverse(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.apex;
        let binormal = self.axis.cross(&self.ref_dir);
        (d.dot(&binormal).atan2(d.dot(&self.ref_dir)), d.norm())
    }
}

impl Surface for Cone {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let binormal = self.axis.cross(&self.ref_dir);
        let (sa, ca) = self.half_angle.sin_cos();
        let radial = self.ref_dir * u.cos() + binormal * u.sin();
        Ok(self.apex + (self.axis * ca + radial * sa) * v)
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        if v.abs() < TOLERANCE {
            return Err(GeometryError::Degenerate("cone normal is singular at the apex".into()).into());
        }
        let binormal = self.axis.cross(&self.ref_dir);
        let radial = self.ref_dir * u.cos() + binormal * u.sin();
        Ok(radial * self.half_angle.cos() - self.axis * self.half_angle.sin())
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, std::f64::consts::TAU, 0.0, f64::INFINITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    fn z_cone() -> Cone {
        Cone::new(Point3::origin(), Vector3::z(), FRAC_PI_4, Vector3::x()).unwrap()
    }

    #[test]
    fn normal_is_perpendicular_to_generator() {
        let c = z_cone();
        let p = c.evaluate(0.3, 2.0).unwrap();
        let generator = (p - c.apex()).normalize();
        let n = c.normal(0.3, 2.0).unwrap();
        assert_relative_eq!(n.dot(&generator), 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.normal_at_point(&p).unwrap(), n, epsilon = 1e-12);
    }

    #[test]
    fn apex_is_singular() {
        let c = z_cone();
        assert!(c.normal(0.0, 0.0).is_err());
        assert!(c.normal_at_point(&Point3::origin()).is_err());
    }

    #[test]
    fn half_angle_range_is_checked() {
        assert!(Cone::new(Point3::origin(), Vector3::z(), 0.0, Vector3::x()).is_err());
    }
}
