use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::document::{Color, Document, Entity, EntityId};
use crate::error::{ExportError, ExportResult};
use crate::math::polygon_3d::triangle_area;
use crate::tessellation::{TessellateFace, TessellationParams};
use crate::topology::{FaceId, MaterialId, TopologyStore};

/// Absolute area difference under which two materials tie.
pub const AREA_TIE_TOLERANCE: f64 = 1e-6;

/// Identifies an element of the caller's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

/// Element-level material parameters, consulted when the geometry itself
/// carries no material.
#[derive(Debug, Clone, Default)]
pub struct ElementMaterials {
    pub category_material: Option<MaterialId>,
    pub structural_material: Option<MaterialId>,
    /// Type element whose materials apply when this element has none.
    pub system_type: Option<ElementId>,
}

/// How a material renders.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAppearance {
    pub name: String,
    pub color: Color,
    /// `0` is opaque, `1` fully transparent.
    pub transparency: f64,
}

impl MaterialAppearance {
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            transparency: 0.0,
        }
    }

    #[must_use]
    pub fn with_transparency(mut self, transparency: f64) -> Self {
        self.transparency = transparency.clamp(0.0, 1.0);
        self
    }
}

/// Material data of the caller's model, handed to the exporter explicitly.
#[derive(Debug, Clone, Default)]
pub struct MaterialContext {
    elements: BTreeMap<ElementId, ElementMaterials>,
    materials: BTreeMap<MaterialId, MaterialAppearance>,
}

impl MaterialContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a material's appearance.
    #[must_use]
    pub fn with_material(mut self, id: MaterialId, appearance: MaterialAppearance) -> Self {
        self.materials.insert(id, appearance);
        self
    }

    /// Registers an element's material parameters.
    #[must_use]
    pub fn with_element(mut self, id: ElementId, materials: ElementMaterials) -> Self {
        self.elements.insert(id, materials);
        self
    }

    #[must_use]
    pub fn appearance(&self, id: MaterialId) -> Option<&MaterialAppearance> {
        self.materials.get(&id)
    }

    /// The element-level material: category material, then structural
    /// material, then the same lookup on the system type, recursively.
    #[must_use]
    pub fn element_material(&self, element: ElementId) -> Option<MaterialId> {
        let mut visited = BTreeSet::new();
        let mut current = element;
        while visited.insert(current) {
            let params = self.elements.get(&current)?;
            if let Some(id) = params.category_material.or(params.structural_material) {
                return Some(id);
            }
            current = params.system_type?;
        }
        None
    }
}

/// The material and color applied to one representation item.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialBinding {
    pub material: Option<MaterialId>,
    pub color: Color,
    pub opacity: f64,
}

impl Default for MaterialBinding {
    fn default() -> Self {
        Self {
            material: None,
            color: Color::DEFAULT,
            opacity: 1.0,
        }
    }
}

/// Resolves the dominant material of a fragment by face area.
pub struct MaterialColorResolver<'a> {
    context: &'a MaterialContext,
}

impl<'a> MaterialColorResolver<'a> {
    #[must_use]
    pub fn new(context: &'a MaterialContext) -> Self {
        Self { context }
    }

    /// The material with the largest accumulated area. Ties within
    /// [`AREA_TIE_TOLERANCE`] go to the lowest material id.
    #[must_use]
    pub fn dominant(areas: impl IntoIterator<Item = (MaterialId, f64)>) -> Option<MaterialId> {
        let mut totals: BTreeMap<MaterialId, f64> = BTreeMap::new();
        for (id, area) in areas {
            *totals.entry(id).or_insert(0.0) += area;
        }
        let top = totals.values().copied().fold(f64::NEG_INFINITY, f64::max);
        totals
            .into_iter()
            .find(|&(_, area)| area >= top - AREA_TIE_TOLERANCE)
            .map(|(id, _)| id)
    }

    /// Accumulates the area of every painted face.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing or cannot be measured.
    pub fn face_areas(store: &TopologyStore, faces: &[FaceId]) -> ExportResult<Vec<(MaterialId, f64)>> {
        let mut areas = Vec::new();
        for &face in faces {
            let Some(material) = store.face(face)?.material else {
                continue;
            };
            let mesh = TessellateFace::new(face, TessellationParams::coarse())
                .execute(store)
                .map_err(ExportError::degenerate)?;
            let area: f64 = mesh
                .indices
                .iter()
                .map(|t| triangle_area(&mesh.vertices[t[0]], &mesh.vertices[t[1]], &mesh.vertices[t[2]]))
                .sum();
            areas.push((material, area));
        }
        Ok(areas)
    }

    /// Builds the binding for a geometry-level material, falling back to the
    /// element's own material parameters.
    #[must_use]
    pub fn binding(&self, geometry_material: Option<MaterialId>, element: Option<ElementId>) -> MaterialBinding {
        let material = geometry_material.or_else(|| element.and_then(|e| self.context.element_material(e)));
        let Some(id) = material else {
            return MaterialBinding::default();
        };
        match self.context.appearance(id) {
            Some(look) => MaterialBinding {
                material: Some(id),
                color: look.color,
                opacity: 1.0 - look.transparency,
            },
            None => MaterialBinding {
                material: Some(id),
                ..MaterialBinding::default()
            },
        }
    }

    /// Resolves the binding of a set of kernel faces.
    ///
    /// # Errors
    ///
    /// Returns an error if a face is missing or cannot be measured.
    pub fn resolve_faces(
        &self,
        store: &TopologyStore,
        faces: &[FaceId],
        element: Option<ElementId>,
    ) -> ExportResult<MaterialBinding> {
        let material = Self::dominant(Self::face_areas(store, faces)?);
        Ok(self.binding(material, element))
    }
}

/// One surface style per material per document.
///
/// Entries whose style was rolled back out of the document are rebuilt on
/// the next request.
#[derive(Debug, Default)]
pub struct StyleCache {
    styles: BTreeMap<MaterialId, EntityId>,
}

impl StyleCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the style of the bound material, creating it if needed.
    /// Unbound items get no style.
    ///
    /// # Errors
    ///
    /// Returns an error if the document rejects the style entity.
    pub fn style(
        &mut self,
        doc: &mut Document,
        context: &MaterialContext,
        binding: &MaterialBinding,
    ) -> ExportResult<Option<EntityId>> {
        let Some(material) = binding.material else {
            return Ok(None);
        };
        if let Some(&id) = self.styles.get(&material) {
            if doc.contains(id) {
                return Ok(Some(id));
            }
            trace!(?material, "style was rolled back, rebuilding");
        }
        let name = context
            .appearance(material)
            .map_or_else(|| format!("Material {}", material.0), |look| look.name.clone());
        let id = doc.add(Entity::SurfaceStyle {
            material,
            name,
            color: binding.color,
            transparency: 1.0 - binding.opacity,
        })?;
        self.styles.insert(material, id);
        Ok(Some(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::creation::MakeBox;
    use approx::assert_relative_eq;

    const A: MaterialId = MaterialId(1);
    const B: MaterialId = MaterialId(2);

    #[test]
    fn near_equal_areas_go_to_the_lower_id() {
        assert_eq!(MaterialColorResolver::dominant([(B, 10.000_000_1), (A, 10.0)]), Some(A));
    }

    #[test]
    fn ties_are_measured_against_the_largest_area() {
        let c = MaterialId(3);
        let areas = [(A, 10.0), (B, 10.000_000_9), (c, 10.000_001_8)];
        assert_eq!(MaterialColorResolver::dominant(areas), Some(B));
    }

    #[test]
    fn larger_area_wins() {
        assert_eq!(MaterialColorResolver::dominant([(A, 10.0), (B, 20.0)]), Some(B));
    }

    #[test]
    fn areas_accumulate_per_material() {
        assert_eq!(MaterialColorResolver::dominant([(A, 10.0), (B, 15.0), (A, 10.0)]), Some(A));
        assert_eq!(MaterialColorResolver::dominant(Vec::new()), None);
    }

    #[test]
    fn face_area_decides_not_face_count() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(4.0, 4.0, 1.0)).execute(&mut store).unwrap();
        let faces = store.solid_faces(solid).unwrap();
        // Bottom and top (16 each) against the four sides (4 each).
        for (i, &face) in faces.iter().enumerate() {
            store.face_mut(face).unwrap().material = Some(if i < 2 { B } else { A });
        }
        let areas = MaterialColorResolver::face_areas(&store, &faces).unwrap();
        let total: f64 = areas.iter().map(|(_, a)| a).sum();
        assert_relative_eq!(total, 48.0, epsilon = 1e-9);
        assert_eq!(MaterialColorResolver::dominant(areas), Some(B));
    }

    #[test]
    fn element_fallback_walks_the_system_type() {
        let context = MaterialContext::new()
            .with_material(A, MaterialAppearance::new("Concrete", Color::new(0.8, 0.8, 0.8)).with_transparency(0.25))
            .with_element(
                ElementId(10),
                ElementMaterials {
                    system_type: Some(ElementId(11)),
                    ..ElementMaterials::default()
                },
            )
            .with_element(
                ElementId(11),
                ElementMaterials {
                    structural_material: Some(A),
                    ..ElementMaterials::default()
                },
            );
        let resolver = MaterialColorResolver::new(&context);
        let binding = resolver.binding(None, Some(ElementId(10)));
        assert_eq!(binding.material, Some(A));
        assert_relative_eq!(binding.opacity, 0.75);
        assert_eq!(binding.color, Color::new(0.8, 0.8, 0.8));
        // Geometry materials take precedence over element parameters.
        assert_eq!(resolver.binding(Some(B), Some(ElementId(10))).material, Some(B));
    }

    #[test]
    fn cyclic_system_types_end_in_the_default() {
        let context = MaterialContext::new()
            .with_element(
                ElementId(1),
                ElementMaterials {
                    system_type: Some(ElementId(2)),
                    ..ElementMaterials::default()
                },
            )
            .with_element(
                ElementId(2),
                ElementMaterials {
                    system_type: Some(ElementId(1)),
                    ..ElementMaterials::default()
                },
            );
        let binding = MaterialColorResolver::new(&context).binding(None, Some(ElementId(1)));
        assert_eq!(binding, MaterialBinding::default());
    }

    #[test]
    fn styles_are_shared_and_rebuilt_after_rollback() {
        let steel = MaterialAppearance::new("Steel", Color::new(0.2, 0.2, 0.3));
        let context = MaterialContext::new().with_material(A, steel);
        let binding = MaterialColorResolver::new(&context).binding(Some(A), None);
        let mut doc = Document::new();
        let mut cache = StyleCache::new();
        {
            let mut tx = doc.transaction();
            cache.style(&mut tx, &context, &binding).unwrap();
        }
        assert!(doc.is_empty());
        let first = cache.style(&mut doc, &context, &binding).unwrap().unwrap();
        let second = cache.style(&mut doc, &context, &binding).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.len(), 1);
        assert!(cache.style(&mut doc, &context, &MaterialBinding::default()).unwrap().is_none());
    }
}
