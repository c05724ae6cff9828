use std::collections::BTreeMap;

use crate::document::{Document, Entity, EntityId};
use crate::error::{ExportError, ExportResult};
use crate::math::fuzzy::{PlaneKey, VertexCache};
use crate::math::polygon_3d::{newell_normal, point_in_polygon_2d, project_to_frame, signed_area_2d};
use crate::math::{perpendicular_dir, Point2, Point3, Vector3};
use crate::tessellation::TriangleMesh;
use crate::topology::{EdgeCurve, FaceId, FaceSurface, TopologyStore};

use super::closure::is_closed_facets;

/// One planar face: an outer loop and optional holes, as indices into the
/// owning [`FacetSet`]'s vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub outer: Vec<usize>,
    pub inner: Vec<Vec<usize>>,
    /// Supporting plane; `None` for slivers whose normal is undefined.
    pub plane: Option<PlaneKey>,
}

impl Facet {
    /// A facet without holes.
    #[must_use]
    pub fn new(outer: Vec<usize>, plane: Option<PlaneKey>) -> Self {
        Self {
            outer,
            inner: Vec::new(),
            plane,
        }
    }

    /// All loops, outer first.
    pub fn loops(&self) -> impl Iterator<Item = &[usize]> {
        std::iter::once(self.outer.as_slice()).chain(self.inner.iter().map(Vec::as_slice))
    }
}

/// Facets over a shared vertex list, with their closure status.
#[derive(Debug, Clone, Default)]
pub struct FacetSet {
    pub vertices: Vec<Point3>,
    pub facets: Vec<Facet>,
    pub is_closed: bool,
}

impl FacetSet {
    /// Builds a facet set and computes its closure.
    #[must_use]
    pub fn new(vertices: Vec<Point3>, facets: Vec<Facet>) -> Self {
        let is_closed = is_closed_facets(&facets);
        Self {
            vertices,
            facets,
            is_closed,
        }
    }

    /// One facet per triangle, without merging.
    #[must_use]
    pub fn from_triangles(mesh: &TriangleMesh) -> Self {
        let facets = mesh
            .indices
            .iter()
            .map(|t| {
                let plane = newell_normal(&[mesh.vertices[t[0]], mesh.vertices[t[1]], mesh.vertices[t[2]]])
                    .map(|n| PlaneKey::new(n, &mesh.vertices[t[0]]));
                Facet::new(t.to_vec(), plane)
            })
            .collect();
        Self::new(mesh.vertices.clone(), facets)
    }

    /// Writes the facets as `Face` entities sharing one point entity per
    /// vertex, with coordinates shifted by `shift`.
    ///
    /// # Errors
    ///
    /// Returns an error if a loop refers to a vertex outside the set.
    pub fn emit_faces(&self, doc: &mut Document, shift: &Vector3) -> ExportResult<Vec<EntityId>> {
        let mut points: BTreeMap<usize, EntityId> = BTreeMap::new();
        let mut faces = Vec::with_capacity(self.facets.len());
        for facet in &self.facets {
            let mut bounds = Vec::with_capacity(1 + facet.inner.len());
            for (k, lp) in facet.loops().enumerate() {
                let mut ids = Vec::with_capacity(lp.len());
                for &v in lp {
                    let id = match points.get(&v) {
                        Some(&id) => id,
                        None => {
                            let p = self.vertices.get(v).ok_or_else(|| {
                                ExportError::GeometryExtraction(format!("facet vertex {v} out of range"))
                            })?;
                            let id = doc.add(Entity::CartesianPoint(p - shift))?;
                            points.insert(v, id);
                            id
                        }
                    };
                    ids.push(id);
                }
                let poly = doc.add(Entity::PolyLoop { points: ids })?;
                bounds.push(doc.add(Entity::FaceBound {
                    bound: poly,
                    orientation: true,
                    outer: k == 0,
                })?);
            }
            faces.push(doc.add(Entity::Face { bounds })?);
        }
        Ok(faces)
    }

    /// Writes the facets as one shell: closed or open per [`Self::is_closed`].
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::emit_faces`].
    pub fn emit_shell(&self, doc: &mut Document, shift: &Vector3) -> ExportResult<EntityId> {
        let faces = self.emit_faces(doc, shift)?;
        let shell = if self.is_closed {
            Entity::ClosedShell { faces }
        } else {
            Entity::OpenShell { faces }
        };
        doc.add(shell)
    }
}

/// Groups the loops of one planar face into `(outer, holes)` sets.
///
/// Loops are nested by 2D containment: a loop inside an even number of other
/// loops is an outer bound, any other loop is a hole of the smallest outer
/// bound around it. Groups are ordered by their outer loop's input index.
#[must_use]
pub fn partition_loops(loops: &[Vec<Point2>]) -> Vec<(usize, Vec<usize>)> {
    let areas: Vec<f64> = loops.iter().map(|l| signed_area_2d(l).abs()).collect();
    let containers: Vec<Vec<usize>> = (0..loops.len())
        .map(|i| {
            let Some(probe) = loops[i].first() else {
                return Vec::new();
            };
            (0..loops.len())
                .filter(|&j| j != i && areas[j] > areas[i] && point_in_polygon_2d(probe, &loops[j]))
                .collect()
        })
        .collect();

    let is_outer = |i: usize| containers[i].len() % 2 == 0;
    let mut groups: Vec<(usize, Vec<usize>)> =
        (0..loops.len()).filter(|&i| is_outer(i)).map(|i| (i, Vec::new())).collect();
    for i in (0..loops.len()).filter(|&i| !is_outer(i)) {
        let parent = containers[i]
            .iter()
            .copied()
            .filter(|&j| is_outer(j))
            .min_by(|&a, &b| areas[a].total_cmp(&areas[b]));
        if let Some(parent) = parent {
            if let Some(group) = groups.iter_mut().find(|(o, _)| *o == parent) {
                group.1.push(i);
            }
        }
    }
    groups
}

/// Returns `true` if every face is planar and bounded by straight edges only.
///
/// # Errors
///
/// Returns an error if a face, wire or edge is missing.
pub fn is_polyhedral(store: &TopologyStore, faces: &[FaceId]) -> ExportResult<bool> {
    for &face in faces {
        if !matches!(store.face(face)?.surface, FaceSurface::Plane(_)) {
            return Ok(false);
        }
        for wire in store.face_wires(face)? {
            for oe in &store.wire(wire)?.edges {
                let edge = store.edge(oe.edge)?;
                if !matches!(edge.curve, EdgeCurve::Line(_)) {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

/// Builds exact facets from polyhedral kernel faces, deduplicating vertices
/// within `epsilon`.
///
/// # Errors
///
/// Returns [`ExportError::DegenerateInput`] if a loop collapses below three
/// vertices or a face has no usable plane.
pub fn polyhedral_facets(store: &TopologyStore, faces: &[FaceId], epsilon: f64) -> ExportResult<FacetSet> {
    let mut cache = VertexCache::new(epsilon);
    let mut facets = Vec::new();
    for &face in faces {
        let mut loops: Vec<Vec<usize>> = Vec::new();
        for wire in store.face_wires(face)? {
            let mut ids: Vec<usize> = Vec::new();
            for v in store.wire_vertices(wire)? {
                let p = store.vertex(v)?.point;
                let id = cache.insert(p);
                if ids.last() != Some(&id) {
                    ids.push(id);
                }
            }
            while ids.len() > 1 && ids.first() == ids.last() {
                ids.pop();
            }
            if ids.len() < 3 {
                return Err(ExportError::DegenerateInput(format!(
                    "loop of {} distinct vertices",
                    ids.len()
                )));
            }
            loops.push(ids);
        }

        let outer_points: Vec<Point3> = loops[0].iter().filter_map(|&i| cache.point(i).copied()).collect();
        let normal = newell_normal(&outer_points)
            .ok_or_else(|| ExportError::DegenerateInput("face with zero area".into()))?;
        let plane = PlaneKey::new(normal, &outer_points[0]);
        let u_dir = perpendicular_dir(&normal);
        let v_dir = normal.cross(&u_dir);
        let loops_2d: Vec<Vec<Point2>> = loops
            .iter()
            .map(|l| {
                let pts: Vec<Point3> = l.iter().filter_map(|&i| cache.point(i).copied()).collect();
                project_to_frame(&pts, &outer_points[0], &u_dir, &v_dir)
            })
            .collect();
        for (outer, holes) in partition_loops(&loops_2d) {
            facets.push(Facet {
                outer: loops[outer].clone(),
                inner: holes.iter().map(|&h| loops[h].clone()).collect(),
                plane: Some(plane),
            });
        }
    }
    Ok(FacetSet::new(cache.into_points(), facets))
}
