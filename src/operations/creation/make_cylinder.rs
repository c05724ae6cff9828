use std::f64::consts::PI;

use crate::error::{OperationError, Result};
use crate::geometry::curve::{Circle, Curve, Line};
use crate::geometry::surface::{Cylinder, Plane};
use crate::math::{perpendicular_dir, Point3, Vector3, TOLERANCE};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceSurface, OrientedEdge, ShellData, SolidId, TopologyStore, VertexData, VertexId,
    WireData,
};

use super::{MakeFace, MakeSolid};

/// Creates a cylinder solid from center, radius, axis, and height.
///
/// The solid has four faces: two cylindrical halves split along two seam
/// lines, and two planar discs. Each rim circle is split into two arcs.
pub struct MakeCylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    height: f64,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, axis: Vector3, height: f64) -> Self {
        Self {
            center,
            radius,
            axis,
            height,
        }
    }

    /// Executes the operation, creating the cylinder in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or height is near zero, or the axis
    /// direction is degenerate.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.radius < TOLERANCE {
            return Err(OperationError::InvalidInput("cylinder radius must be positive".into()).into());
        }
        if self.height < TOLERANCE {
            return Err(OperationError::InvalidInput("cylinder height must be positive".into()).into());
        }
        let axis_len = self.axis.norm();
        if axis_len < TOLERANCE {
            return Err(OperationError::InvalidInput("cylinder axis must be non-zero".into()).into());
        }
        let axis = self.axis / axis_len;
        let ref_dir = perpendicular_dir(&axis);
        let side = FaceSurface::Cylinder(Cylinder::new(self.center, self.radius, axis, ref_dir)?);
        RoundSolid {
            center: self.center,
            axis,
            ref_dir,
            bottom_radius: self.radius,
            top_radius: self.radius,
            height: self.height,
        }
        .build(store, side)
    }
}

/// A solid of revolution between two parallel rim circles.
pub(super) struct RoundSolid {
    pub center: Point3,
    pub axis: Vector3,
    pub ref_dir: Vector3,
    pub bottom_radius: f64,
    pub top_radius: f64,
    pub height: f64,
}

impl RoundSolid {
    /// Builds the rims, the two seams and the four faces, with `side` as the
    /// surface of both lateral halves.
    pub fn build(&self, store: &mut TopologyStore, side: FaceSurface) -> Result<SolidId> {
        let top_center = self.center + self.axis * self.height;
        let bottom = Circle::new(self.center, self.bottom_radius, self.axis, self.ref_dir)?;
        let top = Circle::new(top_center, self.top_radius, self.axis, self.ref_dir)?;

        // Vertices at angle 0 and PI on each rim.
        let b0 = store.add_vertex(VertexData::new(bottom.evaluate(0.0)?));
        let b1 = store.add_vertex(VertexData::new(bottom.evaluate(PI)?));
        let t0 = store.add_vertex(VertexData::new(top.evaluate(0.0)?));
        let t1 = store.add_vertex(VertexData::new(top.evaluate(PI)?));

        let arc = |store: &mut TopologyStore, circle: &Circle, start, end, t_start: f64| {
            store.add_edge(EdgeData {
                start,
                end,
                curve: EdgeCurve::Arc(circle.clone()),
                t_start,
                t_end: t_start + PI,
            })
        };
        let bottom_a = arc(store, &bottom, b0, b1, 0.0);
        let bottom_b = arc(store, &bottom, b1, b0, PI);
        let top_a = arc(store, &top, t0, t1, 0.0);
        let top_b = arc(store, &top, t1, t0, PI);
        let seam_0 = add_line(store, b0, t0)?;
        let seam_1 = add_line(store, b1, t1)?;

        let side_a = store.add_wire(WireData {
            edges: vec![
                OrientedEdge::new(bottom_a, true),
                OrientedEdge::new(seam_1, true),
                OrientedEdge::new(top_a, false),
                OrientedEdge::new(seam_0, false),
            ],
        });
        let side_b = store.add_wire(WireData {
            edges: vec![
                OrientedEdge::new(bottom_b, true),
                OrientedEdge::new(seam_0, true),
                OrientedEdge::new(top_b, false),
                OrientedEdge::new(seam_1, false),
            ],
        });
        let bottom_wire = store.add_wire(WireData {
            edges: vec![OrientedEdge::new(bottom_b, false), OrientedEdge::new(bottom_a, false)],
        });
        let top_wire = store.add_wire(WireData {
            edges: vec![OrientedEdge::new(top_a, true), OrientedEdge::new(top_b, true)],
        });

        let side_a = MakeFace::new(side_a, vec![]).with_surface(side.clone()).execute(store)?;
        let side_b = MakeFace::new(side_b, vec![]).with_surface(side).execute(store)?;
        let bottom_face = MakeFace::new(bottom_wire, vec![])
            .with_surface(FaceSurface::Plane(Plane::new(self.center, -self.axis, self.ref_dir)?))
            .execute(store)?;
        let top_face = MakeFace::new(top_wire, vec![])
            .with_surface(FaceSurface::Plane(Plane::new(top_center, self.axis, self.ref_dir)?))
            .execute(store)?;

        let shell = store.add_shell(ShellData {
            faces: vec![side_a, side_b, bottom_face, top_face],
            is_closed: true,
        });
        MakeSolid::new(shell, vec![]).execute(store)
    }
}

fn add_line(store: &mut TopologyStore, start: VertexId, end: VertexId) -> Result<EdgeId> {
    let p0 = store.vertex(start)?.point;
    let p1 = store.vertex(end)?.point;
    Ok(store.add_edge(EdgeData {
        start,
        end,
        curve: EdgeCurve::Line(Line::through(p0, p1)?),
        t_start: 0.0,
        t_end: (p1 - p0).norm(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn cylinder_has_4_faces() {
        let mut store = TopologyStore::new();
        let solid = MakeCylinder::new(p(0.0, 0.0, 0.0), 3.0, Vector3::z(), 6.0)
            .execute(&mut store)
            .unwrap();
        let faces = store.solid_faces(solid).unwrap();
        assert_eq!(faces.len(), 4);
        assert!(matches!(store.face(faces[0]).unwrap().surface, FaceSurface::Cylinder(_)));
    }

    #[test]
    fn every_edge_is_used_twice() {
        let mut store = TopologyStore::new();
        let solid = MakeCylinder::new(p(1.0, 2.0, 3.0), 0.5, Vector3::new(1.0, 1.0, 0.0), 2.0)
            .execute(&mut store)
            .unwrap();
        let faces = store.solid_faces(solid).unwrap();
        let uses = store.edge_use_counts(&faces).unwrap();
        assert_eq!(uses.len(), 6);
        assert!(uses.values().all(|&n| n == 2));
    }

    #[test]
    fn zero_radius_fails() {
        let mut store = TopologyStore::new();
        let result = MakeCylinder::new(p(0.0, 0.0, 0.0), 0.0, Vector3::z(), 5.0).execute(&mut store);
        assert!(result.is_err());
    }

    #[test]
    fn zero_height_fails() {
        let mut store = TopologyStore::new();
        let result = MakeCylinder::new(p(0.0, 0.0, 0.0), 3.0, Vector3::z(), 0.0).execute(&mut store);
        assert!(result.is_err());
    }
}
