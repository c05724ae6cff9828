use crate::error::{GeometryError, Result};
use crate::math::{perpendicular_dir, Point3, Vector3, TOLERANCE};

use super::{Surface, SurfaceDomain};

/// An infinite plane `P(u, v) = origin + u * u_dir + v * v_dir`.
///
/// The frame is orthonormal and the normal is `u_dir x v_dir`.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a reference direction in the plane
    /// plus the plane normal.
    ///
    /// The reference direction is re-orthogonalized against the normal.
    ///
    /// # Errors
    ///
    /// Returns an error if either vector is zero-length or they are parallel.
    pub fn new(origin: Point3, normal: Vector3, ref_dir: Vector3) -> Result<Self> {
        let n_len = normal.norm();
        if n_len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / n_len;
        let projected = ref_dir - normal * ref_dir.dot(&normal);
        let p_len = projected.norm();
        if p_len < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "plane reference direction is parallel to the normal".into(),
            )
            .into());
        }
        let u_dir = projected / p_len;
        let v_dir = normal.cross(&u_dir);
        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates a plane from an origin and a normal, choosing the in-plane
    /// reference direction automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let unit = normal / len;
        Self::new(origin, unit, perpendicular_dir(&unit))
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of `point` from the plane.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Computes the `(u, v)` parameters of the projection of `point`.
    #[must_use]
    pub fn inverse(&self, point: &Point3) -> (f64, f64) {
        let d = point - self.origin;
        (d.dot(&self.u_dir), d.dot(&self.v_dir))
    }
}

impl Surface for Plane {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        Ok(self.origin + self.u_dir * u + self.v_dir * v)
    }

    fn normal(&self, _u: f64, _v: f64) -> Result<Vector3> {
        Ok(self.normal)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frame_is_right_handed() {
        let p = Plane::new(Point3::new(0.0, 0.0, 2.0), Vector3::z(), Vector3::new(1.0, 0.0, 0.3)).unwrap();
        assert_relative_eq!(*p.u_dir(), Vector3::x(), epsilon = 1e-12);
        assert_relative_eq!(*p.v_dir(), Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(p.signed_distance(&Point3::new(5.0, 5.0, 3.0)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn inverse_roundtrip() {
        let p = Plane::from_normal(Point3::new(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 0.0)).unwrap();
        let q = p.evaluate(0.5, -2.0).unwrap();
        let (u, v) = p.inverse(&q);
        assert_relative_eq!(u, 0.5, epsilon = 1e-12);
        assert_relative_eq!(v, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn parallel_reference_is_rejected() {
        assert!(Plane::new(Point3::origin(), Vector3::z(), Vector3::z()).is_err());
    }
}
