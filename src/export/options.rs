use crate::math::Point3;
use crate::tessellation::{LevelOfDetail, TessellationParams};

/// Target schema and exchange view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVersion {
    Ifc2x3,
    #[default]
    Ifc4,
    /// IFC4 reference view: tessellated geometry only.
    Ifc4ReferenceView,
    /// IFC4 design transfer view: exact geometry allowed.
    Ifc4DesignTransferView,
}

impl SchemaVersion {
    /// Whether advanced BReps with analytic and NURBS surfaces may be written.
    #[must_use]
    pub fn allows_advanced_brep(self) -> bool {
        matches!(self, Self::Ifc4 | Self::Ifc4DesignTransferView)
    }

    /// Whether triangulated face sets exist in the schema.
    #[must_use]
    pub fn allows_tessellated_face_set(self) -> bool {
        !matches!(self, Self::Ifc2x3)
    }

    /// Whether faceted BReps may be written.
    #[must_use]
    pub fn allows_faceted_brep(self) -> bool {
        !matches!(self, Self::Ifc4ReferenceView)
    }

    /// Whether extrusions and other swept solids may be written.
    #[must_use]
    pub fn allows_swept_solid(self) -> bool {
        !matches!(self, Self::Ifc4ReferenceView)
    }
}

/// Bounds on tessellation output. The values are empirical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetCaps {
    /// Triangle cap at the coarse level of detail.
    pub coarse_triangle_cap: usize,
    /// Triangle cap at every other level of detail.
    pub triangle_cap: usize,
    /// Planar groups with more triangles than this are not merged.
    pub merge_bucket_cap: usize,
}

impl FacetCaps {
    /// Triangle cap for a level of detail.
    #[must_use]
    pub fn triangle_cap_for(&self, level: LevelOfDetail) -> usize {
        match level {
            LevelOfDetail::Coarse => self.coarse_triangle_cap,
            LevelOfDetail::Normal | LevelOfDetail::Fine => self.triangle_cap,
        }
    }
}

impl Default for FacetCaps {
    fn default() -> Self {
        Self {
            coarse_triangle_cap: 25_000,
            triangle_cap: 50_000,
            merge_bucket_cap: 150,
        }
    }
}

/// Configuration of a body export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub schema: SchemaVersion,
    pub level_of_detail: LevelOfDetail,
    /// Explicit tessellation precision; defaults to the level of detail's preset.
    pub tessellation: Option<TessellationParams>,
    /// Emit only triangles: no exact or swept geometry, no facet merging.
    pub triangulated_only: bool,
    pub caps: FacetCaps,
    /// Overrides the kernel's vertex tolerance for point deduplication.
    pub vertex_tolerance: Option<f64>,
    /// Allow swept and BRep items in one body representation.
    pub allow_mixed_solid_models: bool,
    /// Emit coordinates relative to this point.
    pub local_origin: Option<Point3>,
}

impl ExportOptions {
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaVersion) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn with_level_of_detail(mut self, level: LevelOfDetail) -> Self {
        self.level_of_detail = level;
        self
    }

    #[must_use]
    pub fn with_tessellation(mut self, params: TessellationParams) -> Self {
        self.tessellation = Some(params);
        self
    }

    #[must_use]
    pub fn with_triangulated_only(mut self, triangulated_only: bool) -> Self {
        self.triangulated_only = triangulated_only;
        self
    }

    #[must_use]
    pub fn with_caps(mut self, caps: FacetCaps) -> Self {
        self.caps = caps;
        self
    }

    #[must_use]
    pub fn with_vertex_tolerance(mut self, tolerance: f64) -> Self {
        self.vertex_tolerance = Some(tolerance);
        self
    }

    #[must_use]
    pub fn with_mixed_solid_models(mut self, allow: bool) -> Self {
        self.allow_mixed_solid_models = allow;
        self
    }

    #[must_use]
    pub fn with_local_origin(mut self, origin: Point3) -> Self {
        self.local_origin = Some(origin);
        self
    }

    /// Tessellation precision requested for the first pass.
    #[must_use]
    pub fn requested_tessellation(&self) -> TessellationParams {
        self.tessellation.unwrap_or_else(|| self.level_of_detail.params())
    }

    /// Triangle cap for the configured level of detail.
    #[must_use]
    pub fn triangle_cap(&self) -> usize {
        self.caps.triangle_cap_for(self.level_of_detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_capabilities() {
        assert!(!SchemaVersion::Ifc2x3.allows_advanced_brep());
        assert!(!SchemaVersion::Ifc2x3.allows_tessellated_face_set());
        assert!(SchemaVersion::Ifc2x3.allows_faceted_brep());
        assert!(SchemaVersion::Ifc4DesignTransferView.allows_advanced_brep());
        assert!(!SchemaVersion::Ifc4ReferenceView.allows_advanced_brep());
        assert!(!SchemaVersion::Ifc4ReferenceView.allows_faceted_brep());
        assert!(!SchemaVersion::Ifc4ReferenceView.allows_swept_solid());
        assert!(SchemaVersion::Ifc4ReferenceView.allows_tessellated_face_set());
    }

    #[test]
    fn coarse_level_uses_the_coarse_cap() {
        let options = ExportOptions::default().with_level_of_detail(LevelOfDetail::Coarse);
        assert_eq!(options.triangle_cap(), 25_000);
        assert_eq!(ExportOptions::default().triangle_cap(), 50_000);
        assert_eq!(options.requested_tessellation(), TessellationParams::coarse());
    }

    #[test]
    fn explicit_precision_overrides_the_preset() {
        let params = TessellationParams::normal().with_tolerance(0.05);
        let options = ExportOptions::default().with_tessellation(params);
        assert_eq!(options.requested_tessellation(), params);
        assert_eq!(options.triangle_cap(), 50_000);
    }
}
