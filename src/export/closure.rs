use std::collections::{BTreeMap, BTreeSet};

use crate::document::{Document, Entity, EntityId};
use crate::error::{ExportError, ExportResult};

use super::facet::Facet;

/// Fewest faces that can bound a solid.
pub const MIN_CLOSED_FACES: usize = 4;

/// Pairs directed edges with their reverses.
///
/// Matched pairs live in an ordered set and pending edges in an ordered map
/// keyed by origin vertex, so results never depend on hashing.
#[derive(Debug, Clone)]
pub struct EdgeMatcher<V> {
    matched: BTreeSet<(V, V)>,
    pending: BTreeMap<V, Vec<V>>,
    unmatched: usize,
    valid: bool,
}

impl<V: Ord + Copy> Default for EdgeMatcher<V> {
    fn default() -> Self {
        Self {
            matched: BTreeSet::new(),
            pending: BTreeMap::new(),
            unmatched: 0,
            valid: true,
        }
    }
}

impl<V: Ord + Copy> EdgeMatcher<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the directed edge `u -> v`.
    ///
    /// Returns `false`, and stays invalid, once an edge shows up in a
    /// configuration a manifold shell cannot have: a loop edge from a vertex
    /// to itself, a second use of an already matched pair, or the same
    /// direction twice.
    pub fn add_edge(&mut self, u: V, v: V) -> bool {
        if !self.valid {
            return false;
        }
        if u == v || self.matched.contains(&undirected(u, v)) {
            self.valid = false;
            return false;
        }
        if self.pending.get(&u).is_some_and(|targets| targets.contains(&v)) {
            self.valid = false;
            return false;
        }
        if let Some(targets) = self.pending.get_mut(&v) {
            if let Some(pos) = targets.iter().position(|&t| t == u) {
                targets.swap_remove(pos);
                if targets.is_empty() {
                    self.pending.remove(&v);
                }
                self.matched.insert(undirected(u, v));
                self.unmatched -= 1;
                return true;
            }
        }
        self.pending.entry(u).or_default().push(v);
        self.unmatched += 1;
        true
    }

    /// Records every edge of a closed vertex loop. Loops with fewer than
    /// three vertices are degenerate and invalidate the shell.
    pub fn add_loop(&mut self, vertices: &[V]) -> bool {
        if vertices.len() < 3 {
            self.valid = false;
            return false;
        }
        let n = vertices.len();
        (0..n).all(|i| self.add_edge(vertices[i], vertices[(i + 1) % n]))
    }

    /// Number of directed edges still waiting for their reverse.
    #[must_use]
    pub fn unmatched_count(&self) -> usize {
        self.unmatched
    }

    /// `false` once a duplicate or degenerate edge has been seen.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Closed: valid and nothing pending.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.valid && self.unmatched == 0
    }
}

fn undirected<V: Ord>(u: V, v: V) -> (V, V) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

/// Outcome of a closure check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellClosure {
    pub closed: bool,
    /// Unmatched directed edges. Zero when the check was rejected up front
    /// (too few faces or a degenerate loop).
    pub unmatched: usize,
}

impl ShellClosure {
    const REJECTED: Self = Self {
        closed: false,
        unmatched: 0,
    };

    fn from_matcher<V: Ord + Copy>(matcher: &EdgeMatcher<V>) -> Self {
        if matcher.is_valid() {
            Self {
                closed: matcher.is_closed(),
                unmatched: matcher.unmatched_count(),
            }
        } else {
            Self::REJECTED
        }
    }
}

/// Checks raw mesh triangles.
#[must_use]
pub fn check_mesh(triangles: &[[usize; 3]]) -> ShellClosure {
    if triangles.len() < MIN_CLOSED_FACES {
        return ShellClosure::REJECTED;
    }
    let mut matcher = EdgeMatcher::new();
    for t in triangles {
        if !matcher.add_loop(t) {
            return ShellClosure::REJECTED;
        }
    }
    ShellClosure::from_matcher(&matcher)
}

/// Checks index-based facets, outer and inner loops alike.
#[must_use]
pub fn check_facets(facets: &[Facet]) -> ShellClosure {
    if facets.len() < MIN_CLOSED_FACES {
        return ShellClosure::REJECTED;
    }
    let mut matcher = EdgeMatcher::new();
    for facet in facets {
        for lp in facet.loops() {
            if !matcher.add_loop(lp) {
                return ShellClosure::REJECTED;
            }
        }
    }
    ShellClosure::from_matcher(&matcher)
}

/// Vertex identity inside document loops.
///
/// Poly loops use their point entities. Edge loops use the two ends of each
/// edge entity, so edges with coincident ends (full circles) still match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LoopVertex {
    Point(EntityId),
    EdgeStart(EntityId),
    EdgeEnd(EntityId),
}

/// Checks faces already written to the document (`Face` or `AdvancedFace`
/// entities), respecting each bound's orientation flag.
///
/// # Errors
///
/// Returns [`ExportError::Document`] if an ID is missing or does not have
/// the expected entity type.
pub fn check_document_faces(doc: &Document, faces: &[EntityId]) -> ExportResult<ShellClosure> {
    if faces.len() < MIN_CLOSED_FACES {
        return Ok(ShellClosure::REJECTED);
    }
    let mut matcher = EdgeMatcher::new();
    for &face in faces {
        let bounds = match doc.get(face)? {
            Entity::Face { bounds } | Entity::AdvancedFace { bounds, .. } => bounds,
            other => return Err(unexpected(other, "face")),
        };
        for &bound in bounds {
            let Entity::FaceBound { bound: lp, orientation, .. } = doc.get(bound)? else {
                return Err(ExportError::Document("face bound expected".into()));
            };
            let ok = match doc.get(*lp)? {
                Entity::PolyLoop { points } => {
                    let mut vertices: Vec<_> = points.iter().map(|&p| LoopVertex::Point(p)).collect();
                    if !orientation {
                        vertices.reverse();
                    }
                    matcher.add_loop(&vertices)
                }
                Entity::EdgeLoop { edges } => {
                    let mut uses = Vec::with_capacity(edges.len());
                    for &oe in edges {
                        let Entity::OrientedEdge { edge, orientation: forward } = doc.get(oe)? else {
                            return Err(ExportError::Document("oriented edge expected".into()));
                        };
                        uses.push((*edge, *forward == *orientation));
                    }
                    !uses.is_empty()
                        && uses.iter().all(|&(edge, forward)| {
                            let (s, e) = (LoopVertex::EdgeStart(edge), LoopVertex::EdgeEnd(edge));
                            if forward {
                                matcher.add_edge(s, e)
                            } else {
                                matcher.add_edge(e, s)
                            }
                        })
                }
                other => return Err(unexpected(other, "loop")),
            };
            if !ok {
                return Ok(ShellClosure::REJECTED);
            }
        }
    }
    Ok(ShellClosure::from_matcher(&matcher))
}

fn unexpected(entity: &Entity, expected: &str) -> ExportError {
    ExportError::Document(format!("{expected} expected, found {}", entity.type_name()))
}

/// `true` if the triangles form a closed shell.
#[must_use]
pub fn is_closed_mesh(triangles: &[[usize; 3]]) -> bool {
    check_mesh(triangles).closed
}

/// `true` if the facets form a closed shell.
#[must_use]
pub fn is_closed_facets(facets: &[Facet]) -> bool {
    check_facets(facets).closed
}

/// `true` if the document faces form a closed shell.
///
/// # Errors
///
/// Returns [`ExportError::Document`] on malformed face entities.
pub fn is_closed_document_faces(doc: &Document, faces: &[EntityId]) -> ExportResult<bool> {
    Ok(check_document_faces(doc, faces)?.closed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    /// Cube corners 0..8 (bit 0 = x, bit 1 = y, bit 2 = z), quads wound
    /// counter-clockwise seen from outside.
    fn cube_quads() -> Vec<Vec<usize>> {
        vec![
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ]
    }

    fn facets(quads: Vec<Vec<usize>>) -> Vec<Facet> {
        quads.into_iter().map(|outer| Facet::new(outer, None)).collect()
    }

    #[test]
    fn cube_is_closed() {
        let result = check_facets(&facets(cube_quads()));
        assert!(result.closed);
        assert_eq!(result.unmatched, 0);
    }

    #[test]
    fn cube_without_a_face_leaves_its_4_edges_unmatched() {
        let mut quads = cube_quads();
        quads.remove(1);
        let result = check_facets(&facets(quads));
        assert!(!result.closed);
        assert_eq!(result.unmatched, 4);
    }

    #[test]
    fn fewer_than_4_faces_never_close() {
        // Each edge of this "pillow" is matched, but 2 faces bound no volume.
        let pillow = facets(vec![vec![0, 1, 2], vec![0, 2, 1]]);
        assert!(!is_closed_facets(&pillow));
        let tris = [[0, 1, 2], [0, 2, 1], [0, 1, 3]];
        assert!(!is_closed_mesh(&tris));
    }

    #[test]
    fn same_directed_edge_twice_is_rejected() {
        let mut quads = cube_quads();
        // Duplicate the top face: every top edge now appears twice in one direction.
        quads.push(vec![4, 5, 7, 6]);
        assert!(!is_closed_facets(&facets(quads)));

        let mut matcher = EdgeMatcher::new();
        assert!(matcher.add_edge(1, 2));
        assert!(!matcher.add_edge(1, 2));
        assert!(!matcher.is_valid());
    }

    #[test]
    fn matched_pair_cannot_be_reused() {
        let mut matcher = EdgeMatcher::new();
        assert!(matcher.add_edge(1, 2));
        assert!(matcher.add_edge(2, 1));
        assert!(matcher.is_closed());
        assert!(!matcher.add_edge(2, 1));
        assert!(!matcher.is_closed());
    }

    #[test]
    fn degenerate_loop_is_rejected() {
        let mut quads = cube_quads();
        quads.push(vec![0, 1]);
        assert!(!is_closed_facets(&facets(quads)));
    }

    #[test]
    fn tetrahedron_mesh_is_closed() {
        let tris = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        assert!(is_closed_mesh(&tris));
        assert!(!is_closed_mesh(&tris[..3]));
    }

    #[test]
    fn document_faces_use_the_same_matching() {
        let mut doc = Document::new();
        let points: Vec<_> = (0..8)
            .map(|i| {
                let p = Point3::new(f64::from(i & 1), f64::from((i >> 1) & 1), f64::from((i >> 2) & 1));
                doc.add(Entity::CartesianPoint(p)).unwrap()
            })
            .collect();
        let mut faces = Vec::new();
        for (k, quad) in cube_quads().into_iter().enumerate() {
            // Store the last face reversed with a flipped bound to exercise orientation.
            let flip = k == 5;
            let mut ids: Vec<_> = quad.iter().map(|&i| points[i]).collect();
            if flip {
                ids.reverse();
            }
            let lp = doc.add(Entity::PolyLoop { points: ids }).unwrap();
            let bound = doc
                .add(Entity::FaceBound {
                    bound: lp,
                    orientation: !flip,
                    outer: true,
                })
                .unwrap();
            faces.push(doc.add(Entity::Face { bounds: vec![bound] }).unwrap());
        }
        assert!(is_closed_document_faces(&doc, &faces).unwrap());
        let open = check_document_faces(&doc, &faces[1..]).unwrap();
        assert!(!open.closed);
        assert_eq!(open.unmatched, 4);
        assert!(check_document_faces(&doc, &[points[0]; 4]).is_err());
    }
}
