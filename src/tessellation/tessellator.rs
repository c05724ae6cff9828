use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{KernelError, Result, TessellationError};
use crate::topology::{SolidId, TopologyStore};

use super::{LevelOfDetail, TessellateSolid, TessellationParams, TriangleMesh};

/// Which precision pass produced a tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TessellationPass {
    /// The precision the caller asked for.
    Requested,
    /// The preset of the configured level of detail.
    Original,
    /// The coarse preset, as a last resort.
    Coarse,
}

/// Result of a capped tessellation.
#[derive(Debug, Clone)]
pub struct TessellatorOutput {
    /// Connected shell components, in order of their first triangle.
    pub components: Vec<TriangleMesh>,
    /// The pass whose result was accepted.
    pub pass: TessellationPass,
    /// The parameters of that pass.
    pub params: TessellationParams,
}

impl TessellatorOutput {
    /// Total triangle count over all components.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.components.iter().map(TriangleMesh::triangle_count).sum()
    }
}

/// Tessellates a solid under a triangle cap, degrading precision until the
/// result fits.
///
/// Up to three passes run in order (requested precision, the level of
/// detail's preset, the coarse preset); the first that succeeds and stays
/// within the cap is accepted.
pub struct Tessellator {
    solid: SolidId,
    passes: Vec<(TessellationPass, TessellationParams)>,
    triangle_cap: usize,
}

impl Tessellator {
    /// Creates a new `Tessellator` operation.
    #[must_use]
    pub fn new(solid: SolidId, requested: TessellationParams, level: LevelOfDetail, triangle_cap: usize) -> Self {
        let mut passes = vec![(TessellationPass::Requested, requested)];
        for (pass, params) in [
            (TessellationPass::Original, level.params()),
            (TessellationPass::Coarse, TessellationParams::coarse()),
        ] {
            if passes.iter().all(|(_, p)| *p != params) {
                passes.push((pass, params));
            }
        }
        Self {
            solid,
            passes,
            triangle_cap,
        }
    }

    /// Executes the passes and splits the accepted mesh into components.
    ///
    /// # Errors
    ///
    /// Returns [`TessellationError::Failed`] if every pass either fails or
    /// exceeds the triangle cap. Missing entities are reported as they are.
    pub fn execute(&self, store: &TopologyStore) -> Result<TessellatorOutput> {
        let mut last_failure = String::from("no tessellation pass ran");
        for &(pass, params) in &self.passes {
            match TessellateSolid::new(self.solid, params).execute(store) {
                Ok(mesh) if mesh.triangle_count() <= self.triangle_cap => {
                    debug!(?pass, triangles = mesh.triangle_count(), "tessellation accepted");
                    return Ok(TessellatorOutput {
                        components: split_components(&mesh),
                        pass,
                        params,
                    });
                }
                Ok(mesh) => {
                    debug!(?pass, triangles = mesh.triangle_count(), cap = self.triangle_cap, "tessellation over cap");
                    last_failure = format!(
                        "{} triangles exceed the cap of {}",
                        mesh.triangle_count(),
                        self.triangle_cap
                    );
                }
                Err(KernelError::Topology(e)) => return Err(e.into()),
                Err(e) => {
                    debug!(?pass, error = %e, "tessellation pass failed");
                    last_failure = e.to_string();
                }
            }
        }
        Err(TessellationError::Failed(last_failure).into())
    }
}

/// Splits a mesh into components connected through shared vertices.
///
/// Components are ordered by their first triangle; each is re-indexed with
/// its vertices in first-use order.
#[must_use]
pub fn split_components(mesh: &TriangleMesh) -> Vec<TriangleMesh> {
    let mut parent: Vec<usize> = (0..mesh.vertices.len()).collect();
    for t in &mesh.indices {
        let root = find(&mut parent, t[0]);
        for &v in &t[1..] {
            let other = find(&mut parent, v);
            if other != root {
                // Keep the smaller index as the root for stable ordering.
                let (lo, hi) = if root < other { (root, other) } else { (other, root) };
                parent[hi] = lo;
            }
        }
    }

    let mut component_of_root: BTreeMap<usize, usize> = BTreeMap::new();
    let mut components: Vec<TriangleMesh> = Vec::new();
    let mut remap: Vec<Vec<Option<usize>>> = Vec::new();
    for t in &mesh.indices {
        let root = find(&mut parent, t[0]);
        let c = *component_of_root.entry(root).or_insert_with(|| {
            components.push(TriangleMesh::default());
            remap.push(vec![None; mesh.vertices.len()]);
            components.len() - 1
        });
        let mut tri = [0usize; 3];
        for (slot, &v) in tri.iter_mut().zip(t) {
            *slot = match remap[c][v] {
                Some(i) => i,
                None => {
                    let i = components[c].vertices.len();
                    components[c].vertices.push(mesh.vertices[v]);
                    remap[c][v] = Some(i);
                    i
                }
            };
        }
        components[c].indices.push(tri);
    }
    components
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};
    use crate::operations::creation::MakeCylinder;

    fn cylinder(store: &mut TopologyStore) -> SolidId {
        MakeCylinder::new(Point3::origin(), 1.0, Vector3::z(), 6.0)
            .execute(store)
            .unwrap()
    }

    #[test]
    fn over_cap_request_degrades_to_the_level_preset() {
        let mut store = TopologyStore::new();
        let solid = cylinder(&mut store);
        let out = Tessellator::new(solid, TessellationParams::fine(), LevelOfDetail::Normal, 100)
            .execute(&store)
            .unwrap();
        assert_eq!(out.pass, TessellationPass::Original);
        assert_eq!(out.triangle_count(), 92);
        assert!(out.triangle_count() <= 100);
    }

    #[test]
    fn falls_back_to_coarse() {
        let mut store = TopologyStore::new();
        let solid = cylinder(&mut store);
        let out = Tessellator::new(solid, TessellationParams::fine(), LevelOfDetail::Fine, 50)
            .execute(&store)
            .unwrap();
        assert_eq!(out.pass, TessellationPass::Coarse);
        assert_eq!(out.triangle_count(), 28);
    }

    #[test]
    fn failing_request_retries_with_the_level_preset() {
        let mut store = TopologyStore::new();
        let solid = cylinder(&mut store);
        // One segment per half rim leaves each cap loop with two points.
        let starved = TessellationParams {
            min_segments: 1,
            max_segments: 1,
            ..TessellationParams::coarse()
        };
        assert!(TessellateSolid::new(solid, starved).execute(&store).is_err());
        let out = Tessellator::new(solid, starved, LevelOfDetail::Normal, 1000)
            .execute(&store)
            .unwrap();
        assert_eq!(out.pass, TessellationPass::Original);
        assert_eq!(out.params, TessellationParams::normal());
        assert_eq!(out.components.len(), 1);
    }

    #[test]
    fn nothing_fits_a_tiny_cap() {
        let mut store = TopologyStore::new();
        let solid = cylinder(&mut store);
        let result = Tessellator::new(solid, TessellationParams::normal(), LevelOfDetail::Normal, 10).execute(&store);
        assert!(matches!(result, Err(KernelError::Tessellation(_))));
    }

    #[test]
    fn disjoint_triangles_are_separate_components() {
        let mesh = TriangleMesh {
            vertices: vec![
                Point3::origin(),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
                Point3::new(5.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            indices: vec![[3, 4, 5], [0, 1, 2], [1, 6, 2]],
        };
        let parts = split_components(&mesh);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].indices, vec![[0, 1, 2]]);
        assert_eq!(parts[0].vertices[0], Point3::new(5.0, 0.0, 0.0));
        assert_eq!(parts[1].indices.len(), 2);
        assert_eq!(parts[1].vertices.len(), 4);
    }
}
