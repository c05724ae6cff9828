use nalgebra::{Rotation3, Unit};

use crate::error::{GeometryError, Result};
use crate::geometry::curve::{Curve, NurbsCurve};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{numeric_normal, Surface, SurfaceDomain};

/// A surface swept by rotating a profile curve about an axis.
///
/// `P(u, v) = axis_origin + R(axis, u) * (profile(v) - axis_origin)`, with
/// `u` in `[0, 2pi]` and `v` on the profile's domain.
#[derive(Debug, Clone)]
pub struct Revolution {
    axis_origin: Point3,
    axis: Unit<Vector3>,
    profile: NurbsCurve,
}

impl Revolution {
    /// Creates a new surface of revolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is zero-length or the profile lies
    /// entirely on the axis.
    pub fn new(axis_origin: Point3, axis: Vector3, profile: NurbsCurve) -> Result<Self> {
        if axis.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let axis = Unit::new_normalize(axis);
        let off_axis = profile.control_points().iter().any(|p| {
            let d = p - axis_origin;
            (d - axis.as_ref() * d.dot(&axis)).norm() > TOLERANCE
        });
        if !off_axis {
            return Err(GeometryError::Degenerate("revolution profile lies on its axis".into()).into());
        }
        Ok(Self {
            axis_origin,
            axis,
            profile,
        })
    }

    /// Returns a point on the rotation axis.
    #[must_use]
    pub fn axis_origin(&self) -> &Point3 {
        &self.axis_origin
    }

    /// Returns the unit rotation axis.
    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        self.axis.as_ref()
    }

    /// Returns the profile curve.
    #[must_use]
    pub fn profile(&self) -> &NurbsCurve {
        &self.profile
    }
}

impl Surface for Revolution {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let p = self.profile.evaluate(v)?;
        let rotation = Rotation3::from_axis_angle(&self.axis, u);
        Ok(self.axis_origin + rotation * (p - self.axis_origin))
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        numeric_normal(self, u, v)
    }

    fn domain(&self) -> SurfaceDomain {
        let d = self.profile.domain();
        SurfaceDomain::new(0.0, std::f64::consts::TAU, d.t_min, d.t_max)
    }

    fn is_u_periodic(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn revolving_a_parallel_segment_gives_a_cylinder() {
        let profile = NurbsCurve::segment(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 2.0)).unwrap();
        let s = Revolution::new(Point3::origin(), Vector3::z(), profile).unwrap();
        let p = s.evaluate(FRAC_PI_2, 0.5).unwrap();
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 1.0), epsilon = 1e-12);
        // d/du points along +y at u = 0, d/dv along +z: normal is +x.
        let n = s.normal(0.0, 0.5).unwrap();
        assert_relative_eq!(n, Vector3::x(), epsilon = 1e-9);
        // The seam seen from the end of the period.
        let n = s.normal(std::f64::consts::TAU, 0.5).unwrap();
        assert_relative_eq!(n, Vector3::x(), epsilon = 1e-9);
    }

    #[test]
    fn normal_at_the_profile_end_stays_radial() {
        let profile = NurbsCurve::segment(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 1.0)).unwrap();
        let s = Revolution::new(Point3::origin(), Vector3::z(), profile).unwrap();
        let n = s.normal(0.0, 1.0).unwrap();
        let expected = Vector3::new(1.0, 0.0, -1.0).normalize();
        assert_relative_eq!(n, expected, epsilon = 1e-6);
    }

    #[test]
    fn profile_on_axis_is_rejected() {
        let profile = NurbsCurve::segment(Point3::origin(), Point3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(Revolution::new(Point3::origin(), Vector3::z(), profile).is_err());
    }
}
