use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::geometry::surface::Plane;
use crate::math::polygon_3d::{newell_normal, newell_vector};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::creation::{MakeFace, MakeSolid};
use crate::topology::{
    EdgeCurve, EdgeData, EdgeId, FaceId, FaceSurface, OrientedEdge, ShellData, SolidId, TopologyStore,
    VertexData, VertexId, WireData, WireId,
};

/// Extrudes a planar polygonal face along a direction vector into a prism.
///
/// The prism's faces share their vertices and edges: every edge is used by
/// exactly two faces. Holes in the base face become through-holes.
pub struct Extrude {
    face: FaceId,
    direction: Vector3,
}

/// Bottom and top vertices plus the three edge rings of one profile loop.
struct LoopRing {
    bottom: Vec<VertexId>,
    top: Vec<VertexId>,
    bottom_edges: Vec<EdgeId>,
    top_edges: Vec<EdgeId>,
    vertical_edges: Vec<EdgeId>,
}

impl Extrude {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(face: FaceId, direction: Vector3) -> Self {
        Self { face, direction }
    }

    /// Executes the extrusion, creating the solid in the topology store.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the direction is
    /// zero-length or parallel to the face, or if a boundary edge is not a
    /// line.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        if self.direction.norm() < TOLERANCE {
            return Err(OperationError::InvalidInput("extrude direction must be non-zero".into()).into());
        }
        let wires = store.face_wires(self.face)?;
        let mut loops = Vec::with_capacity(wires.len());
        for (k, wire) in wires.into_iter().enumerate() {
            for oe in &store.wire(wire)?.edges {
                if !matches!(store.edge(oe.edge)?.curve, EdgeCurve::Line(_)) {
                    return Err(OperationError::InvalidInput(
                        "only polygonal faces can be extruded".into(),
                    )
                    .into());
                }
            }
            let points = store
                .wire_vertices(wire)?
                .into_iter()
                .map(|v| store.vertex(v).map(|d| d.point))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            // Outer loop counter-clockwise about the direction, holes clockwise.
            let area = newell_vector(&points).dot(&self.direction);
            if area.abs() < TOLERANCE {
                return Err(OperationError::InvalidInput(
                    "extrude direction lies in the profile plane".into(),
                )
                .into());
            }
            let wants_ccw = k == 0;
            if (area > 0.0) == wants_ccw {
                loops.push(points);
            } else {
                loops.push(points.into_iter().rev().collect());
            }
        }

        let rings: Vec<LoopRing> = loops
            .iter()
            .map(|points| self.build_ring(store, points))
            .collect::<Result<_>>()?;

        let unit = self.direction.normalize();
        let profile_normal = newell_normal(&loops[0])
            .ok_or_else(|| OperationError::InvalidInput("profile does not span a plane".into()))?;
        let mut faces = Vec::new();

        // Bottom cap: every ring reversed, outward normal against the profile normal.
        let bottom_wires: Vec<_> = rings
            .iter()
            .map(|r| {
                let edges = r
                    .bottom_edges
                    .iter()
                    .rev()
                    .map(|&e| OrientedEdge::new(e, false))
                    .collect();
                store.add_wire(WireData { edges })
            })
            .collect();
        faces.push(cap_face(store, &loops[0][0], -profile_normal, &loops[0], bottom_wires)?);

        // Top cap: rings as built, outward normal along the profile normal.
        let top_wires: Vec<_> = rings
            .iter()
            .map(|r| {
                let edges = r.top_edges.iter().map(|&e| OrientedEdge::new(e, true)).collect();
                store.add_wire(WireData { edges })
            })
            .collect();
        let top_origin = loops[0][0] + self.direction;
        faces.push(cap_face(store, &top_origin, profile_normal, &loops[0], top_wires)?);

        // Side quads b[i] -> b[i+1] -> t[i+1] -> t[i].
        for (ring, points) in rings.iter().zip(&loops) {
            let n = ring.bottom.len();
            for i in 0..n {
                let j = (i + 1) % n;
                let edge_dir = points[j] - points[i];
                let normal = edge_dir.cross(&unit);
                let wire = store.add_wire(WireData {
                    edges: vec![
                        OrientedEdge::new(ring.bottom_edges[i], true),
                        OrientedEdge::new(ring.vertical_edges[j], true),
                        OrientedEdge::new(ring.top_edges[i], false),
                        OrientedEdge::new(ring.vertical_edges[i], false),
                    ],
                });
                let plane = Plane::new(points[i], normal, edge_dir)?;
                faces.push(MakeFace::new(wire, vec![]).with_surface(FaceSurface::Plane(plane)).execute(store)?);
            }
        }

        let shell = store.add_shell(ShellData {
            faces,
            is_closed: true,
        });
        MakeSolid::new(shell, vec![]).execute(store)
    }

    fn build_ring(&self, store: &mut TopologyStore, points: &[Point3]) -> Result<LoopRing> {
        let n = points.len();
        let bottom: Vec<_> = points.iter().map(|p| store.add_vertex(VertexData::new(*p))).collect();
        let top: Vec<_> = points
            .iter()
            .map(|p| store.add_vertex(VertexData::new(p + self.direction)))
            .collect();
        let mut ring = LoopRing {
            bottom_edges: Vec::with_capacity(n),
            top_edges: Vec::with_capacity(n),
            vertical_edges: Vec::with_capacity(n),
            bottom,
            top,
        };
        for i in 0..n {
            let j = (i + 1) % n;
            ring.bottom_edges
                .push(line_edge(store, ring.bottom[i], ring.bottom[j], points[i], points[j])?);
            ring.top_edges.push(line_edge(
                store,
                ring.top[i],
                ring.top[j],
                points[i] + self.direction,
                points[j] + self.direction,
            )?);
            ring.vertical_edges
                .push(line_edge(store, ring.bottom[i], ring.top[i], points[i], points[i] + self.direction)?);
        }
        Ok(ring)
    }
}

fn line_edge(store: &mut TopologyStore, start: VertexId, end: VertexId, a: Point3, b: Point3) -> Result<EdgeId> {
    Ok(store.add_edge(EdgeData {
        start,
        end,
        curve: EdgeCurve::Line(Line::through(a, b)?),
        t_start: 0.0,
        t_end: (b - a).norm(),
    }))
}

fn cap_face(
    store: &mut TopologyStore,
    origin: &Point3,
    normal: Vector3,
    outer: &[Point3],
    mut wires: Vec<WireId>,
) -> Result<FaceId> {
    let plane = Plane::new(*origin, normal, outer[1] - outer[0])?;
    let outer_wire = wires.remove(0);
    MakeFace::new(outer_wire, wires)
        .with_surface(FaceSurface::Plane(plane))
        .execute(store)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeWire;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn make_face(store: &mut TopologyStore, points: Vec<Point3>, holes: Vec<Vec<Point3>>) -> FaceId {
        let wire = MakeWire::new(points).execute(store).unwrap();
        let inner = holes
            .into_iter()
            .map(|h| MakeWire::new(h).execute(store).unwrap())
            .collect();
        MakeFace::new(wire, inner).execute(store).unwrap()
    }

    fn assert_manifold(store: &TopologyStore, solid: SolidId) {
        let faces = store.solid_faces(solid).unwrap();
        let uses = store.edge_use_counts(&faces).unwrap();
        assert!(uses.values().all(|&n| n == 2));
    }

    #[test]
    fn triangle_prism_has_5_faces() {
        let mut store = TopologyStore::new();
        let face = make_face(&mut store, vec![p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(1.5, 2.0, 0.0)], vec![]);
        let solid = Extrude::new(face, Vector3::new(0.0, 0.0, 3.0)).execute(&mut store).unwrap();
        assert_eq!(store.solid_faces(solid).unwrap().len(), 5);
        assert_manifold(&store, solid);
    }

    #[test]
    fn clockwise_profile_is_reoriented() {
        let mut store = TopologyStore::new();
        let face = make_face(
            &mut store,
            vec![p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 1.0, 0.0), p(1.0, 0.0, 0.0)],
            vec![],
        );
        let solid = Extrude::new(face, Vector3::new(0.0, 0.0, 1.0)).execute(&mut store).unwrap();
        let faces = store.solid_faces(solid).unwrap();
        let FaceSurface::Plane(bottom) = &store.face(faces[0]).unwrap().surface else {
            panic!("bottom cap must be planar");
        };
        assert!(bottom.plane_normal().z < -0.99);
        assert_manifold(&store, solid);
    }

    #[test]
    fn hole_becomes_through_hole() {
        let mut store = TopologyStore::new();
        let face = make_face(
            &mut store,
            vec![p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0), p(4.0, 4.0, 0.0), p(0.0, 4.0, 0.0)],
            vec![vec![p(1.0, 1.0, 0.0), p(3.0, 1.0, 0.0), p(3.0, 3.0, 0.0), p(1.0, 3.0, 0.0)]],
        );
        let solid = Extrude::new(face, Vector3::new(0.0, 0.0, 2.0)).execute(&mut store).unwrap();
        let faces = store.solid_faces(solid).unwrap();
        // Two caps with one hole each, four outer and four inner sides.
        assert_eq!(faces.len(), 10);
        assert_eq!(store.face(faces[0]).unwrap().inner_wires.len(), 1);
        assert_manifold(&store, solid);
    }

    #[test]
    fn zero_direction_fails() {
        let mut store = TopologyStore::new();
        let face = make_face(&mut store, vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], vec![]);
        assert!(Extrude::new(face, Vector3::zeros()).execute(&mut store).is_err());
    }
}
