use crate::math::Point3;

use super::face::MaterialId;

/// A raw triangle mesh handed over by the kernel instead of a solid.
///
/// Triangles index into `vertices` and are wound counter-clockwise seen
/// from outside.
#[derive(Debug, Clone, Default)]
pub struct KernelMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle vertex indices.
    pub triangles: Vec<[usize; 3]>,
    /// Material of the whole mesh, if any.
    pub material: Option<MaterialId>,
}

impl KernelMesh {
    /// Creates a mesh from positions and triangles.
    #[must_use]
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            material: None,
        }
    }

    /// Sets the mesh material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Returns `true` if every triangle index is in range.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.triangles
            .iter()
            .all(|t| t.iter().all(|&i| i < self.vertices.len()))
    }
}
