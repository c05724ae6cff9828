use std::collections::BTreeMap;

use tracing::debug;

use crate::document::{
    BSplineCurveData, BSplineSurfaceData, CurveGeometry, Document, Entity, EntityId, Placement, SurfaceGeometry,
};
use crate::error::{ExportError, ExportResult};
use crate::geometry::curve::NurbsCurve;
use crate::geometry::surface::{NurbsSurfaceData, Plane, Surface};
use crate::math::fuzzy::VertexCache;
use crate::math::nurbs::{collapse_knots, KNOT_TOLERANCE};
use crate::math::polygon_3d::{project_to_frame, triangle_area};
use crate::math::{Point2, Point3, Vector3};
use crate::tessellation::{project_uv, sample_edge_use, TessellateFace, TessellationParams};
use crate::topology::{EdgeCurve, EdgeId, FaceId, FaceSurface, SolidId, TopologyStore, VertexId, WireId};

use super::closure::check_document_faces;
use super::facet::partition_loops;

/// Smallest `|cos|` between surface and face normals that still decides the
/// face orientation.
const ORIENTATION_COS: f64 = 1e-3;

/// Builds an advanced BRep directly from a kernel solid.
///
/// The build is all-or-nothing: any unsupported curve or surface, open
/// edge or degenerate loop fails the whole attempt, and the caller is
/// expected to roll back what was written.
pub struct AdvancedBRepBuilder<'a> {
    store: &'a TopologyStore,
    epsilon: f64,
    shift: Vector3,
}

/// Entities shared between the faces of one build.
struct Shared {
    cache: VertexCache,
    vertex_points: Vec<EntityId>,
    edges: BTreeMap<EdgeId, EntityId>,
}

impl<'a> AdvancedBRepBuilder<'a> {
    /// Creates a builder deduplicating vertices within `epsilon`.
    #[must_use]
    pub fn new(store: &'a TopologyStore, epsilon: f64) -> Self {
        Self {
            store,
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

    /// Writes the solid as an advanced BRep, inner shells as voids.
    ///
    /// # Errors
    ///
    /// - [`ExportError::Topology`] if an edge is not shared by exactly two
    ///   face uses or a written shell does not close.
    /// - [`ExportError::UnsupportedSurface`] for helix edges and surfaces
    ///   without an exact encoding.
    /// - [`ExportError::DegenerateInput`] for collapsed edges, loops or
    ///   unorientable faces.
    pub fn build(&self, doc: &mut Document, solid: SolidId) -> ExportResult<EntityId> {
        let data = self.store.solid(solid)?;
        let faces = self.store.solid_faces(solid)?;
        self.check_preconditions(&faces)?;

        let mut shared = Shared {
            cache: VertexCache::new(self.epsilon),
            vertex_points: Vec::new(),
            edges: BTreeMap::new(),
        };
        let outer = self.build_shell(doc, &mut shared, &self.store.shell(data.outer_shell)?.faces)?;
        let mut voids = Vec::with_capacity(data.inner_shells.len());
        for &inner in &data.inner_shells {
            voids.push(self.build_shell(doc, &mut shared, &self.store.shell(inner)?.faces)?);
        }
        let brep = doc.add(Entity::AdvancedBrep { outer, voids })?;
        debug!(
            faces = faces.len(),
            edges = shared.edges.len(),
            vertices = shared.vertex_points.len(),
            "built advanced brep"
        );
        Ok(brep)
    }

    fn check_preconditions(&self, faces: &[FaceId]) -> ExportResult<()> {
        for (&edge, &uses) in &self.store.edge_use_counts(faces)? {
            if uses != 2 {
                return Err(ExportError::Topology(format!("edge shared by {uses} face uses")));
            }
            let curve = &self.store.edge(edge)?.curve;
            if let EdgeCurve::Helix(_) = curve {
                return Err(ExportError::UnsupportedSurface(format!("{} edge curve", curve.kind_name())));
            }
        }
        Ok(())
    }

    fn build_shell(&self, doc: &mut Document, shared: &mut Shared, faces: &[FaceId]) -> ExportResult<EntityId> {
        let mut advanced = Vec::with_capacity(faces.len());
        for &face in faces {
            advanced.extend(self.build_face(doc, shared, face)?);
        }
        let closure = check_document_faces(doc, &advanced)?;
        if !closure.closed {
            return Err(ExportError::Topology(format!(
                "advanced shell of {} faces is not closed ({} unmatched edges)",
                advanced.len(),
                closure.unmatched
            )));
        }
        doc.add(Entity::ClosedShell { faces: advanced })
    }

    /// Writes one kernel face; planar faces may split into several
    /// advanced faces when their loops form separate outer groups.
    fn build_face(&self, doc: &mut Document, shared: &mut Shared, face: FaceId) -> ExportResult<Vec<EntityId>> {
        let data = self.store.face(face)?;
        let wires = self.store.face_wires(face)?;
        let groups = match &data.surface {
            FaceSurface::Plane(plane) if wires.len() > 1 => self.partition_planar(plane, &wires)?,
            _ => vec![(0, (1..wires.len()).collect())],
        };
        let geometry = self.surface_geometry(doc, face, &data.surface)?;
        let surface = doc.add(Entity::Surface(geometry))?;
        let same_sense = self.same_sense(face, &data.surface)?;

        let mut out = Vec::with_capacity(groups.len());
        for (outer, holes) in groups {
            let mut bounds = vec![self.face_bound(doc, shared, wires[outer], true)?];
            for hole in holes {
                bounds.push(self.face_bound(doc, shared, wires[hole], false)?);
            }
            out.push(doc.add(Entity::AdvancedFace {
                bounds,
                surface,
                same_sense,
            })?);
        }
        Ok(out)
    }

    fn partition_planar(&self, plane: &Plane, wires: &[WireId]) -> ExportResult<Vec<(usize, Vec<usize>)>> {
        let params = TessellationParams::coarse();
        let mut loops: Vec<Vec<Point2>> = Vec::with_capacity(wires.len());
        for &wire in wires {
            let mut points = Vec::new();
            for &oe in &self.store.wire(wire)?.edges {
                points.extend(sample_edge_use(self.store, oe, &params).map_err(ExportError::degenerate)?);
            }
            loops.push(project_to_frame(&points, plane.origin(), plane.u_dir(), plane.v_dir()));
        }
        Ok(partition_loops(&loops))
    }

    fn face_bound(&self, doc: &mut Document, shared: &mut Shared, wire: WireId, outer: bool) -> ExportResult<EntityId> {
        let mut edges = Vec::new();
        for &oe in &self.store.wire(wire)?.edges {
            let edge = self.edge_curve(doc, shared, oe.edge)?;
            edges.push(doc.add(Entity::OrientedEdge {
                edge,
                orientation: oe.forward,
            })?);
        }
        if edges.is_empty() {
            return Err(ExportError::DegenerateInput("empty face loop".into()));
        }
        let edge_loop = doc.add(Entity::EdgeLoop { edges })?;
        doc.add(Entity::FaceBound {
            bound: edge_loop,
            orientation: true,
            outer,
        })
    }

    /// The shared edge curve of a kernel edge, bounded by the edge's own
    /// start and end vertices.
    fn edge_curve(&self, doc: &mut Document, shared: &mut Shared, edge_id: EdgeId) -> ExportResult<EntityId> {
        if let Some(&id) = shared.edges.get(&edge_id) {
            return Ok(id);
        }
        let edge = self.store.edge(edge_id)?;
        let start = self.vertex_point(doc, shared, edge.start)?;
        let end = self.vertex_point(doc, shared, edge.end)?;
        if start == end && !edge.is_closed() {
            return Err(ExportError::DegenerateInput("edge shorter than the vertex tolerance".into()));
        }
        let curve = doc.add(Entity::Curve(self.curve_geometry(&edge.curve)?))?;
        let id = doc.add(Entity::EdgeCurve {
            start,
            end,
            curve,
            same_sense: edge.t_end >= edge.t_start,
        })?;
        shared.edges.insert(edge_id, id);
        Ok(id)
    }

    fn vertex_point(&self, doc: &mut Document, shared: &mut Shared, vertex: VertexId) -> ExportResult<EntityId> {
        let p = self.store.vertex(vertex)?.point;
        let idx = shared.cache.insert(p);
        if let Some(&id) = shared.vertex_points.get(idx) {
            return Ok(id);
        }
        let point = doc.add(Entity::CartesianPoint(p - self.shift))?;
        let id = doc.add(Entity::VertexPoint { point })?;
        shared.vertex_points.push(id);
        Ok(id)
    }

    fn curve_geometry(&self, curve: &EdgeCurve) -> ExportResult<CurveGeometry> {
        Ok(match curve {
            EdgeCurve::Line(line) => CurveGeometry::Line {
                origin: line.origin() - self.shift,
                direction: *line.direction(),
            },
            EdgeCurve::Arc(circle) => CurveGeometry::Circle {
                position: Placement::new(circle.center() - self.shift, *circle.normal(), *circle.ref_dir()),
                radius: circle.radius(),
            },
            EdgeCurve::Nurbs(nurbs) => CurveGeometry::BSpline(self.bspline_curve(nurbs)),
            EdgeCurve::Helix(_) => return Err(ExportError::UnsupportedSurface("helix edge curve".into())),
        })
    }

    fn bspline_curve(&self, curve: &NurbsCurve) -> BSplineCurveData {
        let (knots, multiplicities) = collapse_knots(curve.knots(), KNOT_TOLERANCE);
        BSplineCurveData {
            degree: curve.degree(),
            control_points: curve.control_points().iter().map(|p| p - self.shift).collect(),
            knots,
            multiplicities,
            weights: curve.weights().map(<[f64]>::to_vec),
        }
    }

    fn bspline_surface(&self, data: &NurbsSurfaceData) -> ExportResult<BSplineSurfaceData> {
        data.validate()
            .map_err(|e| ExportError::UnsupportedSurface(format!("free-form surface: {e}")))?;
        let (u_knots, u_multiplicities) = collapse_knots(&data.u_knots, KNOT_TOLERANCE);
        let (v_knots, v_multiplicities) = collapse_knots(&data.v_knots, KNOT_TOLERANCE);
        Ok(BSplineSurfaceData {
            u_degree: data.u_degree,
            v_degree: data.v_degree,
            control_points: data
                .control_points
                .iter()
                .map(|row| row.iter().map(|p| p - self.shift).collect())
                .collect(),
            u_knots,
            u_multiplicities,
            v_knots,
            v_multiplicities,
            weights: data.weights.clone(),
        })
    }

    fn surface_geometry(
        &self,
        doc: &mut Document,
        face: FaceId,
        surface: &FaceSurface,
    ) -> ExportResult<SurfaceGeometry> {
        Ok(match surface {
            FaceSurface::Plane(plane) => SurfaceGeometry::Plane {
                position: Placement::new(plane.origin() - self.shift, *plane.plane_normal(), *plane.u_dir()),
            },
            FaceSurface::Cylinder(cyl) => SurfaceGeometry::Cylinder {
                position: Placement::new(cyl.center() - self.shift, *cyl.axis(), *cyl.ref_dir()),
                radius: cyl.radius(),
            },
            FaceSurface::Cone(cone) => {
                // Place the cone at the face's far end from the apex, where the radius is positive.
                let mut height = 0.0_f64;
                for wire in self.store.face_wires(face)? {
                    for v in self.store.wire_vertices(wire)? {
                        height = height.max((self.store.vertex(v)?.point - cone.apex()).dot(cone.axis()));
                    }
                }
                if height < self.epsilon {
                    return Err(ExportError::DegenerateInput("conical face collapses onto its apex".into()));
                }
                let location = cone.apex() + cone.axis() * height - self.shift;
                SurfaceGeometry::Cone {
                    position: Placement::new(location, *cone.axis(), *cone.ref_dir()),
                    radius: height * cone.half_angle().tan(),
                    semi_angle: cone.half_angle(),
                }
            }
            FaceSurface::Revolved(rev) => {
                let profile = doc.add(Entity::Curve(CurveGeometry::BSpline(self.bspline_curve(rev.profile()))))?;
                SurfaceGeometry::Revolution {
                    profile,
                    axis_origin: rev.axis_origin() - self.shift,
                    axis: *rev.axis(),
                }
            }
            FaceSurface::Ruled(ruled) => {
                if let Some(offset) = ruled.translation() {
                    let profile =
                        doc.add(Entity::Curve(CurveGeometry::BSpline(self.bspline_curve(ruled.rail0()))))?;
                    let depth = offset.norm();
                    SurfaceGeometry::LinearExtrusion {
                        profile,
                        direction: offset / depth,
                        depth,
                    }
                } else {
                    let nurbs = ruled
                        .to_nurbs()
                        .ok_or_else(|| ExportError::UnsupportedSurface("ruled face with incompatible rails".into()))?;
                    SurfaceGeometry::BSpline(self.bspline_surface(&nurbs)?)
                }
            }
            FaceSurface::Hermite(data) => SurfaceGeometry::BSpline(self.bspline_surface(data)?),
        })
    }

    /// Compares the surface's own normal with the face's outward normal at
    /// the centroid of the face's largest tessellation triangle.
    fn same_sense(&self, face: FaceId, surface: &FaceSurface) -> ExportResult<bool> {
        let mesh = TessellateFace::new(face, TessellationParams::coarse())
            .execute(self.store)
            .map_err(ExportError::degenerate)?;
        let corners = |t: &[usize; 3]| [mesh.vertices[t[0]], mesh.vertices[t[1]], mesh.vertices[t[2]]];
        let [a, b, c] = mesh
            .indices
            .iter()
            .map(corners)
            .max_by(|x, y| triangle_area(&x[0], &x[1], &x[2]).total_cmp(&triangle_area(&y[0], &y[1], &y[2])))
            .ok_or_else(|| ExportError::DegenerateInput("face has no area".into()))?;
        let outward = (b - a).cross(&(c - a));
        let len = outward.norm();
        if len < f64::EPSILON {
            return Err(ExportError::DegenerateInput("face has no area".into()));
        }
        let outward = outward / len;
        let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);

        let normal = match surface {
            FaceSurface::Plane(plane) => Ok(*plane.plane_normal()),
            FaceSurface::Cylinder(cyl) => cyl.radial_at(&centroid),
            FaceSurface::Cone(cone) => cone.normal_at_point(&centroid),
            other => other.with_surface(|s: &dyn Surface| {
                let (u, v) = project_uv(s, &centroid)?;
                s.normal(u, v)
            }),
        }
        .map_err(ExportError::degenerate)?;

        let cos = normal.dot(&outward);
        if cos.abs() < ORIENTATION_COS {
            return Err(ExportError::DegenerateInput("surface normal is tangent to the face".into()));
        }
        Ok(cos > 0.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::curve::Helix;
    use crate::geometry::surface::{Revolution, Ruled};
    use crate::operations::creation::{MakeBox, MakeCylinder, MakeSolid};
    use crate::topology::ShellData;

    fn count(doc: &Document, name: &str) -> usize {
        doc.iter().filter(|(_, e)| e.type_name() == name).count()
    }

    fn advanced_faces(doc: &Document) -> Vec<(EntityId, bool)> {
        doc.iter()
            .filter_map(|(_, e)| match e {
                Entity::AdvancedFace { surface, same_sense, .. } => Some((*surface, *same_sense)),
                _ => None,
            })
            .collect()
    }

    fn unit_box(store: &mut TopologyStore) -> SolidId {
        MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(store).unwrap()
    }

    #[test]
    fn box_shares_vertices_and_edges() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let mut doc = Document::new();
        let brep = AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, solid).unwrap();
        assert_eq!(doc.get(brep).unwrap().type_name(), "IfcAdvancedBrep");
        assert_eq!(count(&doc, "IfcVertexPoint"), 8);
        assert_eq!(count(&doc, "IfcEdgeCurve"), 12);
        assert_eq!(count(&doc, "IfcOrientedEdge"), 24);
        assert_eq!(count(&doc, "IfcPlane"), 6);
        assert!(advanced_faces(&doc).iter().all(|&(_, same)| same));
    }

    #[test]
    fn cylinder_uses_cylindrical_surfaces() {
        let mut store = TopologyStore::new();
        let solid = MakeCylinder::new(Point3::new(5.0, 0.0, 0.0), 1.0, Vector3::z(), 2.0)
            .execute(&mut store)
            .unwrap();
        let mut doc = Document::new();
        AdvancedBRepBuilder::new(&store, 1e-6)
            .with_local_origin(Point3::new(5.0, 0.0, 0.0))
            .build(&mut doc, solid)
            .unwrap();
        assert_eq!(count(&doc, "IfcCylindricalSurface"), 2);
        assert_eq!(count(&doc, "IfcCircle"), 4);
        assert_eq!(count(&doc, "IfcVertexPoint"), 4);
        let on_axis = doc.iter().any(|(_, e)| {
            matches!(
                e,
                Entity::Surface(SurfaceGeometry::Cylinder { position, .. }) if position.location == Point3::origin()
            )
        });
        assert!(on_axis);
        assert!(advanced_faces(&doc).iter().all(|&(_, same)| same));
    }

    #[test]
    fn helix_edges_are_unsupported() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let face = store.solid_faces(solid).unwrap()[0];
        let wire = store.face(face).unwrap().outer_wire;
        let edge = store.wire(wire).unwrap().edges[0].edge;
        store.edge_mut(edge).unwrap().curve =
            EdgeCurve::Helix(Helix::new(Point3::origin(), Vector3::z(), Vector3::x(), 1.0, 1.0).unwrap());
        let mut doc = Document::new();
        let err = AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, solid).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedSurface(_)));
    }

    #[test]
    fn open_shells_are_rejected() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let faces = store.solid_faces(solid).unwrap();
        let shell = store.add_shell(ShellData {
            faces: faces[..5].to_vec(),
            is_closed: false,
        });
        let open = MakeSolid::new(shell, vec![]).execute(&mut store).unwrap();
        let mut doc = Document::new();
        let err = AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, open).unwrap_err();
        assert!(matches!(err, ExportError::Topology(_)));
    }

    /// Corner positions of a box side in loop order.
    fn side_corners(store: &TopologyStore, face: FaceId) -> [Point3; 4] {
        let wire = store.face(face).unwrap().outer_wire;
        let vs = store.wire_vertices(wire).unwrap();
        [0, 1, 2, 3].map(|i| store.vertex(vs[i]).unwrap().point)
    }

    #[test]
    fn translated_rails_become_a_linear_extrusion() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let side = store.solid_faces(solid).unwrap()[2];
        // Side loop: bottom start, bottom end, top end, top start.
        let [b0, b1, t1, t0] = side_corners(&store, side);
        store.face_mut(side).unwrap().surface = FaceSurface::Ruled(Ruled::new(
            NurbsCurve::segment(b0, b1).unwrap(),
            NurbsCurve::segment(t0, t1).unwrap(),
        ));
        let mut doc = Document::new();
        AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, solid).unwrap();
        assert_eq!(count(&doc, "IfcSurfaceOfLinearExtrusion"), 1);
        assert!(advanced_faces(&doc).iter().all(|&(_, same)| same));
    }

    #[test]
    fn free_form_faces_keep_their_orientation_flag() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let faces = store.solid_faces(solid).unwrap();
        let [b0, b1, t1, t0] = side_corners(&store, faces[2]);
        // Rows along U run up the side: the patch normal points inwards.
        let face = store.face_mut(faces[2]).unwrap();
        face.surface = FaceSurface::Hermite(NurbsSurfaceData {
            u_degree: 1,
            v_degree: 1,
            u_knots: vec![0.0, 0.0, 1.0, 1.0],
            v_knots: vec![0.0, 0.0, 1.0, 1.0],
            control_points: vec![vec![b0, b1], vec![t0, t1]],
            weights: None,
        });
        face.same_sense = false;
        let mut doc = Document::new();
        AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, solid).unwrap();
        assert_eq!(count(&doc, "IfcBSplineSurfaceWithKnots"), 1);
        let flags = advanced_faces(&doc);
        assert_eq!(flags.iter().filter(|&&(_, same)| !same).count(), 1);
        let spline = doc.iter().find_map(|(_, e)| match e {
            Entity::Surface(SurfaceGeometry::BSpline(s)) => Some(s.clone()),
            _ => None,
        });
        let spline = spline.unwrap();
        assert_eq!(spline.u_knots, vec![0.0, 1.0]);
        assert_eq!(spline.u_multiplicities, vec![2, 2]);
    }

    #[test]
    fn ragged_free_form_data_is_unsupported() {
        let mut store = TopologyStore::new();
        let solid = unit_box(&mut store);
        let side = store.solid_faces(solid).unwrap()[2];
        let [b0, b1, t1, t0] = side_corners(&store, side);
        store.face_mut(side).unwrap().surface = FaceSurface::Hermite(NurbsSurfaceData {
            u_degree: 1,
            v_degree: 1,
            u_knots: vec![0.0, 0.0, 1.0, 1.0],
            v_knots: vec![0.0, 0.0, 1.0, 1.0],
            control_points: vec![vec![b0, t0], vec![b1, t1, t1]],
            weights: None,
        });
        let mut doc = Document::new();
        let err = AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, solid).unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedSurface(_)));
    }

    #[test]
    fn revolved_sides_emit_surfaces_of_revolution() {
        let mut store = TopologyStore::new();
        let solid = MakeCylinder::new(Point3::origin(), 1.0, Vector3::z(), 2.0).execute(&mut store).unwrap();
        let faces = store.solid_faces(solid).unwrap();
        // The kernel cylinder's seam lies along +y.
        let profile = NurbsCurve::segment(Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 1.0, 2.0)).unwrap();
        let revolution = Revolution::new(Point3::origin(), Vector3::z(), profile).unwrap();
        for &side in &faces[..2] {
            store.face_mut(side).unwrap().surface = FaceSurface::Revolved(revolution.clone());
        }
        let mut doc = Document::new();
        AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, solid).unwrap();
        assert_eq!(count(&doc, "IfcSurfaceOfRevolution"), 2);
        assert!(advanced_faces(&doc).iter().all(|&(_, same)| same));
    }

    #[test]
    fn inner_shells_become_voids() {
        let mut store = TopologyStore::new();
        let outer = MakeBox::new(Point3::origin(), Point3::new(4.0, 4.0, 4.0)).execute(&mut store).unwrap();
        let inner = MakeBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0)).execute(&mut store).unwrap();
        let inner_faces = store.solid_faces(inner).unwrap();
        for &face in &inner_faces {
            let wire = store.face(face).unwrap().outer_wire;
            let edges = &mut store.wire_mut(wire).unwrap().edges;
            edges.reverse();
            for oe in edges.iter_mut() {
                oe.forward = !oe.forward;
            }
            let data = store.face_mut(face).unwrap();
            data.same_sense = !data.same_sense;
        }
        let void_shell = store.solid(inner).unwrap().outer_shell;
        let outer_shell = store.solid(outer).unwrap().outer_shell;
        let hollow = MakeSolid::new(outer_shell, vec![void_shell]).execute(&mut store).unwrap();

        let mut doc = Document::new();
        let brep = AdvancedBRepBuilder::new(&store, 1e-6).build(&mut doc, hollow).unwrap();
        let Entity::AdvancedBrep { voids, .. } = doc.get(brep).unwrap() else {
            panic!("advanced brep expected");
        };
        assert_eq!(voids.len(), 1);
        assert_eq!(doc.get(brep).unwrap().type_name(), "IfcAdvancedBrepWithVoids");
        let flags = advanced_faces(&doc);
        assert_eq!(flags.iter().filter(|&&(_, same)| !same).count(), 6);
    }
}
