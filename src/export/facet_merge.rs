use std::collections::BTreeMap;

use tracing::debug;

use crate::math::fuzzy::PlaneKey;
use crate::math::Point3;
use crate::tessellation::TriangleMesh;

use super::facet::{Facet, FacetSet};

/// Sine of the smallest corner angle a triangle needs to have a normal.
const SLIVER_SINE: f64 = 1e-9;
/// Normals within this `1 - cos` share a planar bucket.
const NORMAL_TOLERANCE: f64 = 1e-6;

/// Merges the triangles of a tessellated shell component into planar
/// facets, falling back to raw triangles where merging is unsafe.
#[derive(Debug, Clone, Copy)]
pub struct FacetMerger {
    distance_tolerance: f64,
    bucket_cap: usize,
}

impl FacetMerger {
    /// Creates a merger. `distance_tolerance` bounds the offset between
    /// planes that share a bucket; buckets with more than `bucket_cap`
    /// triangles are not merged.
    #[must_use]
    pub fn new(distance_tolerance: f64, bucket_cap: usize) -> Self {
        Self {
            distance_tolerance,
            bucket_cap,
        }
    }

    /// Merges `mesh` and computes the closure of the result.
    #[must_use]
    pub fn merge(&self, mesh: &TriangleMesh) -> FacetSet {
        let mut buckets: Vec<(PlaneKey, Vec<usize>)> = Vec::new();
        let mut slivers = Vec::new();
        for (t, tri) in mesh.indices.iter().enumerate() {
            let Some(key) = self.triangle_plane(mesh, tri) else {
                slivers.push(t);
                continue;
            };
            match buckets
                .iter_mut()
                .find(|(k, _)| k.matches(&key, NORMAL_TOLERANCE, self.distance_tolerance))
            {
                Some((_, members)) => members.push(t),
                None => buckets.push((key, vec![t])),
            }
        }

        let mut facets = Vec::new();
        let mut unmerged_buckets = 0usize;
        for (key, members) in &buckets {
            let grown = if members.len() > self.bucket_cap {
                debug!(triangles = members.len(), cap = self.bucket_cap, "planar bucket over merge cap");
                None
            } else {
                grow_facets(&mesh.indices, members)
            };
            match grown {
                Some(loops) => facets.extend(loops.into_iter().map(|outer| Facet::new(outer, Some(*key)))),
                None => {
                    unmerged_buckets += 1;
                    facets.extend(members.iter().map(|&t| Facet::new(mesh.indices[t].to_vec(), Some(*key))));
                }
            }
        }
        facets.extend(slivers.iter().map(|&t| Facet::new(mesh.indices[t].to_vec(), None)));

        let set = FacetSet::new(mesh.vertices.clone(), facets);
        debug!(
            triangles = mesh.triangle_count(),
            buckets = buckets.len(),
            unmerged_buckets,
            slivers = slivers.len(),
            facets = set.facets.len(),
            closed = set.is_closed,
            "merged coplanar triangles"
        );
        set
    }

    /// Supporting plane of a triangle, or `None` for slivers.
    fn triangle_plane(&self, mesh: &TriangleMesh, tri: &[usize; 3]) -> Option<PlaneKey> {
        let [a, b, c]: [&Point3; 3] = [&mesh.vertices[tri[0]], &mesh.vertices[tri[1]], &mesh.vertices[tri[2]]];
        let (e1, e2) = (b - a, c - a);
        if e1.norm() < self.distance_tolerance || e2.norm() < self.distance_tolerance {
            return None;
        }
        let n = e1.normalize().cross(&e2.normalize());
        let len = n.norm();
        (len > SLIVER_SINE).then(|| PlaneKey::new(n / len, a))
    }
}

/// Grows connected facets over the triangles `members` of one planar bucket.
///
/// Each facet starts from an unvisited triangle. Its boundary loop is
/// scanned for an edge `a -> b` whose reverse belongs to an unvisited
/// neighbour; the neighbour's third vertex is spliced in between `a` and
/// `b`. When the third vertex is already the loop's next or previous vertex
/// the neighbour fills a notch and the shared corner is dropped instead.
///
/// Returns `None` when a splice would repeat a vertex elsewhere in the loop.
fn grow_facets(triangles: &[[usize; 3]], members: &[usize]) -> Option<Vec<Vec<usize>>> {
    let mut touching: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (k, &t) in members.iter().enumerate() {
        for &v in &triangles[t] {
            touching.entry(v).or_default().push(k);
        }
    }

    let mut visited = vec![false; members.len()];
    let mut loops = Vec::new();
    for start in 0..members.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut ring: Vec<usize> = triangles[members[start]].to_vec();

        'grow: loop {
            let n = ring.len();
            for i in 0..n {
                let (a, b) = (ring[i], ring[(i + 1) % n]);
                let Some((k, w)) = find_neighbor(triangles, members, &touching, &visited, b, a) else {
                    continue;
                };
                visited[k] = true;
                let next = (i + 2) % n;
                let prev = (i + n - 1) % n;
                if ring[next] == w || ring[prev] == w {
                    if n <= 3 {
                        return None;
                    }
                    ring.remove(if ring[next] == w { (i + 1) % n } else { i });
                } else if ring.contains(&w) {
                    return None;
                } else {
                    ring.insert(i + 1, w);
                }
                continue 'grow;
            }
            break;
        }
        loops.push(ring);
    }
    Some(loops)
}

/// Finds an unvisited bucket triangle containing the directed edge `u -> v`,
/// returning its member index and its third vertex.
fn find_neighbor(
    triangles: &[[usize; 3]],
    members: &[usize],
    touching: &BTreeMap<usize, Vec<usize>>,
    visited: &[bool],
    u: usize,
    v: usize,
) -> Option<(usize, usize)> {
    touching.get(&u)?.iter().find_map(|&k| {
        if visited[k] {
            return None;
        }
        let t = triangles[members[k]];
        (0..3).find_map(|i| (t[i] == u && t[(i + 1) % 3] == v).then_some((k, t[(i + 2) % 3])))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::export::closure::is_closed_mesh;
    use crate::operations::creation::MakeBox;
    use crate::tessellation::{TessellateSolid, TessellationParams};
    use crate::topology::TopologyStore;
    use std::collections::BTreeSet;

    fn mesh(points: &[(f64, f64)], indices: Vec<[usize; 3]>) -> TriangleMesh {
        TriangleMesh {
            vertices: points.iter().map(|&(x, y)| Point3::new(x, y, 0.0)).collect(),
            indices,
        }
    }

    #[test]
    fn two_right_triangles_become_one_quad() {
        let m = mesh(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], vec![[0, 1, 2], [0, 2, 3]]);
        let set = FacetMerger::new(1e-6, 150).merge(&m);
        assert_eq!(set.facets.len(), 1);
        let merged: BTreeSet<_> = set.facets[0].outer.iter().copied().collect();
        assert_eq!(merged, BTreeSet::from([0, 1, 2, 3]));
        assert_eq!(set.facets[0].outer.len(), 4);
        assert_eq!(set.is_closed, is_closed_mesh(&m.indices));
    }

    #[test]
    fn fan_around_a_center_merges_to_its_rim() {
        let m = mesh(
            &[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 2.0)],
            vec![[0, 1, 2], [2, 1, 3], [2, 3, 4], [4, 0, 2]],
        );
        let set = FacetMerger::new(1e-6, 150).merge(&m);
        assert_eq!(set.facets.len(), 1);
        assert_eq!(set.facets[0].outer, vec![0, 1, 3, 4]);
    }

    #[test]
    fn pinched_growth_falls_back_to_triangles() {
        // A square frame: growing around the hole meets the start vertex again.
        let m = mesh(
            &[
                (0.0, 0.0),
                (3.0, 0.0),
                (3.0, 3.0),
                (0.0, 3.0),
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 2.0),
                (1.0, 2.0),
            ],
            vec![
                [0, 1, 5],
                [0, 5, 4],
                [1, 2, 6],
                [1, 6, 5],
                [2, 3, 7],
                [2, 7, 6],
                [3, 0, 4],
                [3, 4, 7],
            ],
        );
        let set = FacetMerger::new(1e-6, 150).merge(&m);
        assert_eq!(set.facets.len(), 8);
        for facet in &set.facets {
            let unique: BTreeSet<_> = facet.outer.iter().collect();
            assert_eq!(unique.len(), facet.outer.len());
        }
    }

    #[test]
    fn buckets_over_the_cap_stay_triangles() {
        let m = mesh(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], vec![[0, 1, 2], [0, 2, 3]]);
        let set = FacetMerger::new(1e-6, 1).merge(&m);
        assert_eq!(set.facets.len(), 2);
    }

    #[test]
    fn slivers_pass_through() {
        let m = mesh(
            &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 0.0)],
            vec![[0, 1, 2], [0, 1, 3]],
        );
        let set = FacetMerger::new(1e-6, 150).merge(&m);
        assert_eq!(set.facets.len(), 2);
        assert!(set.facets[1].plane.is_none());
    }

    #[test]
    fn tessellated_box_merges_to_6_closed_quads() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0)).execute(&mut store).unwrap();
        let m = TessellateSolid::new(solid, TessellationParams::default()).execute(&store).unwrap();
        assert!(is_closed_mesh(&m.indices));
        let set = FacetMerger::new(1e-6, 150).merge(&m);
        assert_eq!(set.facets.len(), 6);
        assert!(set.facets.iter().all(|f| f.outer.len() == 4));
        assert!(set.is_closed);
    }
}
