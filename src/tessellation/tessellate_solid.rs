use crate::error::Result;
use crate::math::fuzzy::VertexCache;
use crate::topology::{SolidId, TopologyStore};

use super::{TessellateFace, TessellationParams, TriangleMesh};

/// Tessellates all faces of a solid into one welded triangle mesh.
///
/// Vertices closer than the kernel's vertex tolerance are merged, and
/// triangles that collapse under the merge are dropped.
pub struct TessellateSolid {
    solid: SolidId,
    params: TessellationParams,
}

impl TessellateSolid {
    /// Creates a new `TessellateSolid` operation.
    #[must_use]
    pub fn new(solid: SolidId, params: TessellationParams) -> Self {
        Self { solid, params }
    }

    /// Executes the tessellation, returning a welded triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid or any of its faces cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let mut cache = VertexCache::new(store.vertex_tolerance());
        let mut indices = Vec::new();
        for face in store.solid_faces(self.solid)? {
            let face_mesh = TessellateFace::new(face, self.params).execute(store)?;
            let welded: Vec<usize> = face_mesh.vertices.iter().map(|p| cache.insert(*p)).collect();
            for t in &face_mesh.indices {
                let tri = [welded[t[0]], welded[t[1]], welded[t[2]]];
                if tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2] {
                    indices.push(tri);
                }
            }
        }
        Ok(TriangleMesh {
            vertices: cache.into_points(),
            indices,
        })
    }
}
