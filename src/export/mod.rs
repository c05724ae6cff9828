pub mod advanced_brep;
pub mod body;
pub mod closure;
pub mod extrusion;
pub mod facet;
pub mod facet_merge;
pub mod material;
pub mod options;
pub mod selector;
pub mod swept;

pub use advanced_brep::AdvancedBRepBuilder;
pub use body::{
    BodyData, FragmentGeometry, GeometryFragment, RepresentationItem, RepresentationKind, RepresentationType,
};
pub use closure::{check_document_faces, check_facets, check_mesh, EdgeMatcher, ShellClosure};
pub use extrusion::ExtrusionBuilder;
pub use facet::{Facet, FacetSet};
pub use facet_merge::FacetMerger;
pub use material::{
    ElementId, ElementMaterials, MaterialAppearance, MaterialBinding, MaterialColorResolver, MaterialContext,
    StyleCache,
};
pub use options::{ExportOptions, FacetCaps, SchemaVersion};
pub use selector::{eligible_strategies, export_elements, CascadeMode, ElementExports, ExportBody, ExportContext};
pub use swept::{SweepHint, SweepPath, SweptSolidBuilder};
