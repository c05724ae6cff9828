use crate::error::{OperationError, Result};
use crate::geometry::surface::Cone;
use crate::math::{perpendicular_dir, Point3, Vector3, TOLERANCE};
use crate::topology::{FaceSurface, SolidId, TopologyStore};

use super::make_cylinder::RoundSolid;

/// Creates a conical frustum from a base center, axis, the two rim radii and
/// the height.
pub struct MakeCone {
    center: Point3,
    axis: Vector3,
    bottom_radius: f64,
    top_radius: f64,
    height: f64,
}

impl MakeCone {
    /// Creates a new `MakeCone` operation.
    #[must_use]
    pub fn new(center: Point3, axis: Vector3, bottom_radius: f64, top_radius: f64, height: f64) -> Self {
        Self {
            center,
            axis,
            bottom_radius,
            top_radius,
            height,
        }
    }

    /// Executes the operation, creating the frustum in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if a radius or the height is not positive, the radii
    /// are equal, or the axis is degenerate.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let (r0, r1, h) = (self.bottom_radius, self.top_radius, self.height);
        if r0 < TOLERANCE || r1 < TOLERANCE || h < TOLERANCE {
            return Err(OperationError::InvalidInput("frustum radii and height must be positive".into()).into());
        }
        if (r0 - r1).abs() < TOLERANCE {
            return Err(OperationError::InvalidInput("equal radii describe a cylinder".into()).into());
        }
        let axis_len = self.axis.norm();
        if axis_len < TOLERANCE {
            return Err(OperationError::InvalidInput("frustum axis must be non-zero".into()).into());
        }
        let axis = self.axis / axis_len;
        let ref_dir = perpendicular_dir(&axis);
        let half_angle = ((r0 - r1).abs() / h).atan();
        // The apex sits on the narrow side; the cone axis points towards the wide rim.
        let cone = if r0 > r1 {
            Cone::new(self.center + axis * (h * r0 / (r0 - r1)), -axis, half_angle, ref_dir)?
        } else {
            Cone::new(self.center - axis * (h * r0 / (r1 - r0)), axis, half_angle, ref_dir)?
        };
        RoundSolid {
            center: self.center,
            axis,
            ref_dir,
            bottom_radius: r0,
            top_radius: r1,
            height: h,
        }
        .build(store, FaceSurface::Cone(cone))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::surface::Surface;
    use approx::assert_relative_eq;

    #[test]
    fn rims_lie_on_the_cone() {
        let mut store = TopologyStore::new();
        let solid = MakeCone::new(Point3::origin(), Vector3::z(), 2.0, 1.0, 3.0)
            .execute(&mut store)
            .unwrap();
        let faces = store.solid_faces(solid).unwrap();
        let FaceSurface::Cone(cone) = &store.face(faces[0]).unwrap().surface else {
            panic!("lateral face must be conical");
        };
        assert_relative_eq!(cone.apex().z, 6.0, epsilon = 1e-12);
        let (u, v) = cone.inverse(&Point3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(cone.evaluate(u, v).unwrap(), Point3::new(2.0, 0.0, 0.0), epsilon = 1e-9);
        let n = cone.normal_at_point(&Point3::new(2.0, 0.0, 0.0)).unwrap();
        assert!(n.x > 0.0 && n.z > 0.0);
    }

    #[test]
    fn equal_radii_fail() {
        let mut store = TopologyStore::new();
        assert!(MakeCone::new(Point3::origin(), Vector3::z(), 1.0, 1.0, 1.0)
            .execute(&mut store)
            .is_err());
    }
}
