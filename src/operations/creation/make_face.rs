use crate::error::{OperationError, Result};
use crate::geometry::surface::Plane;
use crate::math::polygon_3d::newell_normal;
use crate::math::Point3;
use crate::topology::{FaceData, FaceId, FaceSurface, MaterialId, TopologyStore, WireId};

/// Creates a face from boundary wires.
///
/// Without an explicit surface the face is planar, with the plane fitted to
/// the outer wire's vertices and oriented by their winding.
pub struct MakeFace {
    outer_wire: WireId,
    inner_wires: Vec<WireId>,
    surface: Option<FaceSurface>,
    material: Option<MaterialId>,
}

impl MakeFace {
    /// Creates a new `MakeFace` operation.
    #[must_use]
    pub fn new(outer_wire: WireId, inner_wires: Vec<WireId>) -> Self {
        Self {
            outer_wire,
            inner_wires,
            surface: None,
            material: None,
        }
    }

    /// Uses `surface` instead of fitting a plane. The outward normal is
    /// taken to agree with the surface normal.
    #[must_use]
    pub fn with_surface(mut self, surface: FaceSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Paints the face with a material.
    #[must_use]
    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    /// Executes the operation, creating the face in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if a wire is missing or not closed, or if no plane
    /// can be fitted to the outer wire.
    pub fn execute(self, store: &mut TopologyStore) -> Result<FaceId> {
        let outer = store.wire_vertices(self.outer_wire)?;
        for &inner in &self.inner_wires {
            store.wire_vertices(inner)?;
        }
        let surface = match self.surface {
            Some(surface) => surface,
            None => {
                let points = outer
                    .iter()
                    .map(|&v| store.vertex(v).map(|d| d.point))
                    .collect::<std::result::Result<Vec<Point3>, _>>()?;
                let normal = newell_normal(&points).ok_or_else(|| {
                    OperationError::InvalidInput("outer wire does not span a plane".into())
                })?;
                let ref_dir = points[1] - points[0];
                FaceSurface::Plane(Plane::new(points[0], normal, ref_dir)?)
            }
        };
        Ok(store.add_face(FaceData {
            surface,
            outer_wire: self.outer_wire,
            inner_wires: self.inner_wires,
            same_sense: true,
            material: self.material,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Vector3;
    use crate::operations::creation::MakeWire;
    use approx::assert_relative_eq;

    #[test]
    fn planar_face_follows_winding() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
        ])
        .execute(&mut store)
        .unwrap();
        let face = MakeFace::new(wire, vec![])
            .with_material(MaterialId(7))
            .execute(&mut store)
            .unwrap();
        let data = store.face(face).unwrap();
        let FaceSurface::Plane(plane) = &data.surface else {
            panic!("expected a planar face");
        };
        assert_relative_eq!(*plane.plane_normal(), -Vector3::z(), epsilon = 1e-12);
        assert_eq!(data.material, Some(MaterialId(7)));
    }
}
