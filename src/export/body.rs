use crate::document::EntityId;
use crate::math::Matrix4;
use crate::topology::{KernelMesh, MaterialId, SolidId};

use super::material::MaterialBinding;
use super::swept::SweepHint;

/// The geometry of one fragment.
#[derive(Debug, Clone)]
pub enum FragmentGeometry {
    /// A kernel solid with exact faces and edges.
    Solid(SolidId),
    /// A raw triangle mesh.
    Mesh(KernelMesh),
}

/// One piece of an element's body.
#[derive(Debug, Clone)]
pub struct GeometryFragment {
    pub geometry: FragmentGeometry,
    /// Construction history, if the body is known to be a sweep.
    pub sweep: Option<SweepHint>,
}

impl GeometryFragment {
    #[must_use]
    pub fn solid(solid: SolidId) -> Self {
        Self {
            geometry: FragmentGeometry::Solid(solid),
            sweep: None,
        }
    }

    #[must_use]
    pub fn mesh(mesh: KernelMesh) -> Self {
        Self {
            geometry: FragmentGeometry::Mesh(mesh),
            sweep: None,
        }
    }

    #[must_use]
    pub fn with_sweep(mut self, sweep: SweepHint) -> Self {
        self.sweep = Some(sweep);
        self
    }
}

/// Which encoding a representation item uses, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RepresentationKind {
    Extrusion,
    SweptSolid,
    AdvancedBRep,
    TessellatedFaceSet,
    FacetedBRep,
    SurfaceModel,
}

impl RepresentationKind {
    /// Returns `true` for the swept encodings.
    #[must_use]
    pub fn is_sweep(self) -> bool {
        matches!(self, Self::Extrusion | Self::SweptSolid)
    }
}

/// Shape representation type of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationType {
    SweptSolid,
    AdvancedSweptSolid,
    Brep,
    AdvancedBrep,
    Tessellation,
    SurfaceModel,
    /// Items of different kinds.
    SolidModel,
}

impl RepresentationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SweptSolid => "SweptSolid",
            Self::AdvancedSweptSolid => "AdvancedSweptSolid",
            Self::Brep => "Brep",
            Self::AdvancedBrep => "AdvancedBrep",
            Self::Tessellation => "Tessellation",
            Self::SurfaceModel => "SurfaceModel",
            Self::SolidModel => "SolidModel",
        }
    }

    /// The common type of a set of item types, or `None` if there are no
    /// items.
    #[must_use]
    pub fn combine(types: impl IntoIterator<Item = Self>) -> Option<Self> {
        types
            .into_iter()
            .try_fold(None, |acc: Option<Self>, t| match acc {
                None => Some(Some(t)),
                Some(prev) if prev == t => Some(Some(t)),
                Some(_) => None,
            })
            .map_or(Some(Self::SolidModel), |common| common)
    }
}

/// One committed encoding of one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationItem {
    pub kind: RepresentationKind,
    pub representation_type: RepresentationType,
    /// Top-level entities of the item: one solid, face set or surface model
    /// per shell component.
    pub entities: Vec<EntityId>,
    pub material: MaterialBinding,
    /// Styled item linking the entities to the material's surface style.
    pub style: Option<EntityId>,
}

/// The result of exporting one element's body.
#[derive(Debug, Clone, Default)]
pub struct BodyData {
    pub items: Vec<RepresentationItem>,
    pub representation_type: Option<RepresentationType>,
    /// Materials used by the items, sorted and deduplicated.
    pub material_ids: Vec<MaterialId>,
    /// Translation from emitted coordinates back to world coordinates.
    pub offset_transform: Option<Matrix4>,
    /// Indices of fragments no strategy could encode.
    pub skipped: Vec<usize>,
}

impl BodyData {
    /// Returns `true` if no fragment produced an item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_type_is_kept() {
        let t = RepresentationType::combine([RepresentationType::Brep, RepresentationType::Brep]);
        assert_eq!(t, Some(RepresentationType::Brep));
    }

    #[test]
    fn mixed_types_become_solid_model() {
        let t = RepresentationType::combine([RepresentationType::SweptSolid, RepresentationType::Brep]);
        assert_eq!(t.map(RepresentationType::as_str), Some("SolidModel"));
        assert_eq!(RepresentationType::combine(Vec::new()), None);
    }
}
