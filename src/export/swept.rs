use std::f64::consts::TAU;

use tracing::debug;

use crate::document::{Document, Entity, EntityId, Placement, ProfileCurve, ProfileDef};
use crate::error::{ExportError, ExportResult};
use crate::math::polygon_3d::{newell_normal, signed_area_2d};
use crate::math::{perpendicular_dir, Point2, Point3, Vector3, TOLERANCE};

/// Largest `|cos|` accepted between directions that must be perpendicular.
const ANGULAR_TOLERANCE: f64 = 1e-9;

/// The path a planar profile was swept along.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepPath {
    /// Rotation about an axis lying in the profile plane.
    Revolution {
        axis_origin: Point3,
        axis: Vector3,
        /// Swept angle in radians, in `(0, 2pi]`.
        angle: f64,
    },
    /// A polyline directrix starting on the profile plane.
    Directrix(Vec<Point3>),
}

/// How a fragment's body was built: a closed planar profile (with optional
/// holes) and the path it was swept along.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepHint {
    pub profile: Vec<Point3>,
    pub holes: Vec<Vec<Point3>>,
    pub path: SweepPath,
}

impl SweepHint {
    /// A sweep of a profile without holes.
    #[must_use]
    pub fn new(profile: Vec<Point3>, path: SweepPath) -> Self {
        Self {
            profile,
            holes: Vec::new(),
            path,
        }
    }

    /// Adds a hole to the profile.
    #[must_use]
    pub fn with_hole(mut self, hole: Vec<Point3>) -> Self {
        self.holes.push(hole);
        self
    }

    /// Returns `true` if the sweep needs the advanced swept solid subset.
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(self.path, SweepPath::Directrix(_))
    }
}

/// Encodes a [`SweepHint`] as a revolved or fixed-reference swept area solid.
///
/// The hint is taken to describe the fragment's geometry; only its own
/// consistency is checked.
pub struct SweptSolidBuilder {
    epsilon: f64,
    shift: Vector3,
}

impl SweptSolidBuilder {
    /// Creates a builder with distance tolerance `epsilon`.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            shift: Vector3::zeros(),
        }
    }

    /// Emits coordinates relative to `origin`.
    #[must_use]
    pub fn with_local_origin(mut self, origin: Point3) -> Self {
        self.shift = origin.coords;
        self
    }

    /// Writes the swept solid described by `hint`.
    ///
    /// # Errors
    ///
    /// - [`ExportError::DegenerateInput`] if the profile is not a planar
    ///   polygon, the axis is zero or the angle is out of range.
    /// - [`ExportError::NotApplicable`] if the path does not fit the
    ///   profile (axis outside the plane or crossing the profile, directrix
    ///   not normal to it).
    pub fn build(&self, doc: &mut Document, hint: &SweepHint) -> ExportResult<EntityId> {
        let normal = self.profile_normal(hint)?;
        match &hint.path {
            SweepPath::Revolution {
                axis_origin,
                axis,
                angle,
            } => self.revolution(doc, hint, &normal, axis_origin, axis, *angle),
            SweepPath::Directrix(points) => self.fixed_reference(doc, hint, &normal, points),
        }
    }

    fn profile_normal(&self, hint: &SweepHint) -> ExportResult<Vector3> {
        if hint.profile.len() < 3 {
            return Err(ExportError::DegenerateInput("sweep profile of fewer than three points".into()));
        }
        let normal = newell_normal(&hint.profile)
            .ok_or_else(|| ExportError::DegenerateInput("sweep profile has no area".into()))?;
        let origin = hint.profile[0];
        let off_plane = hint
            .profile
            .iter()
            .chain(hint.holes.iter().flatten())
            .any(|p| (p - origin).dot(&normal).abs() >= self.epsilon);
        if off_plane {
            return Err(ExportError::DegenerateInput("sweep profile is not planar".into()));
        }
        Ok(normal)
    }

    fn revolution(
        &self,
        doc: &mut Document,
        hint: &SweepHint,
        normal: &Vector3,
        axis_origin: &Point3,
        axis: &Vector3,
        angle: f64,
    ) -> ExportResult<EntityId> {
        let len = axis.norm();
        if len < TOLERANCE {
            return Err(ExportError::DegenerateInput("revolution axis has zero length".into()));
        }
        if !(angle > TOLERANCE && angle <= TAU + TOLERANCE) {
            return Err(ExportError::DegenerateInput(format!("revolution angle {angle} out of range")));
        }
        let axis = axis / len;
        if axis.dot(normal).abs() >= ANGULAR_TOLERANCE
            || (axis_origin - hint.profile[0]).dot(normal).abs() >= self.epsilon
        {
            return Err(ExportError::NotApplicable("revolution axis leaves the profile plane"));
        }

        // In-plane direction from the axis towards the profile.
        let across = normal.cross(&axis);
        let sides: Vec<f64> = hint.profile.iter().map(|p| (p - axis_origin).dot(&across)).collect();
        let toward = if sides.iter().all(|&s| s > -self.epsilon) {
            across
        } else if sides.iter().all(|&s| s < self.epsilon) {
            -across
        } else {
            return Err(ExportError::NotApplicable("profile crosses the revolution axis"));
        };
        if sides.iter().all(|s| s.abs() < self.epsilon) {
            return Err(ExportError::DegenerateInput("profile lies on the revolution axis".into()));
        }

        let frame = Placement::new(*axis_origin, *normal, toward);
        let profile = profile_def(hint, &frame);
        let local_axis = frame.direction_to_local(&axis);
        debug!(angle, "encoding revolved area solid");
        doc.add(Entity::RevolvedAreaSolid {
            profile,
            position: self.shifted(&frame),
            axis_origin: Point3::origin(),
            axis: local_axis,
            angle: angle.min(TAU),
        })
    }

    fn fixed_reference(
        &self,
        doc: &mut Document,
        hint: &SweepHint,
        normal: &Vector3,
        directrix: &[Point3],
    ) -> ExportResult<EntityId> {
        let mut path: Vec<Point3> = Vec::with_capacity(directrix.len());
        for p in directrix {
            if path.last().is_none_or(|q| (p - q).norm() >= self.epsilon) {
                path.push(*p);
            }
        }
        let [start, next, ..] = path.as_slice() else {
            return Err(ExportError::DegenerateInput("directrix of fewer than two points".into()));
        };
        let tangent = (next - start).normalize();
        if tangent.dot(normal).abs() <= 1.0 - ANGULAR_TOLERANCE {
            return Err(ExportError::NotApplicable("profile is not normal to the directrix"));
        }
        if (start - hint.profile[0]).dot(normal).abs() >= self.epsilon {
            return Err(ExportError::NotApplicable("directrix does not start on the profile plane"));
        }

        let frame = Placement::new(*start, tangent, perpendicular_dir(&tangent));
        let profile = profile_def(hint, &frame);
        debug!(segments = path.len() - 1, "encoding fixed-reference swept area solid");
        doc.add(Entity::FixedReferenceSweptAreaSolid {
            profile,
            position: self.shifted(&frame),
            directrix: path.iter().map(|p| frame.point_to_local(p)).collect(),
            fixed_reference: Vector3::x(),
        })
    }

    fn shifted(&self, frame: &Placement) -> Placement {
        Placement::new(frame.location - self.shift, frame.axis, frame.ref_direction)
    }
}

fn profile_def(hint: &SweepHint, frame: &Placement) -> ProfileDef {
    let flatten = |points: &[Point3], ccw: bool| {
        let mut flat: Vec<Point2> = points.iter().map(|p| frame.to_local_2d(p)).collect();
        if (signed_area_2d(&flat) > 0.0) != ccw {
            flat.reverse();
        }
        ProfileCurve::Polyline(flat)
    };
    ProfileDef {
        outer: flatten(&hint.profile, true),
        inner: hint.holes.iter().map(|h| flatten(h, false)).collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit square in the XZ plane, one unit away from the Z axis.
    fn ring_section() -> Vec<Point3> {
        vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
        ]
    }

    fn revolve(profile: Vec<Point3>, axis: Vector3, angle: f64) -> SweepHint {
        SweepHint::new(
            profile,
            SweepPath::Revolution {
                axis_origin: Point3::origin(),
                axis,
                angle,
            },
        )
    }

    #[test]
    fn revolved_ring() {
        let mut doc = Document::new();
        let id = SweptSolidBuilder::new(1e-6)
            .build(&mut doc, &revolve(ring_section(), Vector3::z(), TAU))
            .unwrap();
        let Entity::RevolvedAreaSolid {
            profile,
            position,
            axis,
            angle,
            ..
        } = doc.get(id).unwrap()
        else {
            panic!("revolved solid expected");
        };
        assert_relative_eq!(*angle, TAU);
        assert_relative_eq!(axis.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(axis.norm(), 1.0, epsilon = 1e-12);
        // The profile sits on the positive local X side of the axis.
        assert_relative_eq!(position.ref_direction, Vector3::x(), epsilon = 1e-12);
        let ProfileCurve::Polyline(points) = &profile.outer else {
            panic!("polyline expected");
        };
        assert!(points.iter().all(|p| p.x >= 1.0 - 1e-12));
        assert_relative_eq!(signed_area_2d(points), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn profile_crossing_the_axis_is_rejected() {
        let mut profile = ring_section();
        profile[0].x = -1.0;
        let mut doc = Document::new();
        let err = SweptSolidBuilder::new(1e-6)
            .build(&mut doc, &revolve(profile, Vector3::z(), TAU))
            .unwrap_err();
        assert!(matches!(err, ExportError::NotApplicable(_)));
    }

    #[test]
    fn axis_outside_the_profile_plane_is_rejected() {
        let mut doc = Document::new();
        let err = SweptSolidBuilder::new(1e-6)
            .build(&mut doc, &revolve(ring_section(), Vector3::y(), TAU))
            .unwrap_err();
        assert!(matches!(err, ExportError::NotApplicable(_)));
    }

    #[test]
    fn zero_angle_is_degenerate() {
        let mut doc = Document::new();
        let err = SweptSolidBuilder::new(1e-6)
            .build(&mut doc, &revolve(ring_section(), Vector3::z(), 0.0))
            .unwrap_err();
        assert!(matches!(err, ExportError::DegenerateInput(_)));
        assert!(doc.is_empty());
    }

    fn square_xy() -> Vec<Point3> {
        vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ]
    }

    #[test]
    fn directrix_sweep_uses_local_coordinates() {
        let hint = SweepHint::new(
            square_xy(),
            SweepPath::Directrix(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(3.0, 0.0, 9.0),
            ]),
        )
        .with_hole(vec![
            Point3::new(-0.1, -0.1, 0.0),
            Point3::new(0.1, -0.1, 0.0),
            Point3::new(0.1, 0.1, 0.0),
            Point3::new(-0.1, 0.1, 0.0),
        ]);
        assert!(hint.is_advanced());
        let mut doc = Document::new();
        let id = SweptSolidBuilder::new(1e-6)
            .with_local_origin(Point3::new(0.0, 0.0, -1.0))
            .build(&mut doc, &hint)
            .unwrap();
        let Entity::FixedReferenceSweptAreaSolid {
            profile,
            position,
            directrix,
            ..
        } = doc.get(id).unwrap()
        else {
            panic!("swept solid expected");
        };
        assert_relative_eq!(position.location, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-12);
        assert_eq!(directrix.len(), 3);
        assert_relative_eq!(directrix[0], Point3::origin(), epsilon = 1e-12);
        assert_relative_eq!(directrix[1], Point3::new(0.0, 0.0, 5.0), epsilon = 1e-12);
        assert_relative_eq!((directrix[2] - directrix[1]).norm(), 5.0, epsilon = 1e-12);
        assert_eq!(profile.inner.len(), 1);
    }

    #[test]
    fn tilted_profile_is_rejected() {
        let hint = SweepHint::new(
            square_xy(),
            SweepPath::Directrix(vec![Point3::origin(), Point3::new(1.0, 0.0, 1.0)]),
        );
        let mut doc = Document::new();
        let err = SweptSolidBuilder::new(1e-6).build(&mut doc, &hint).unwrap_err();
        assert!(matches!(err, ExportError::NotApplicable(_)));
    }
}
