use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::document::{Document, Entity, EntityId};
use crate::error::{ExportError, ExportResult};
use crate::math::fuzzy::VertexCache;
use crate::math::{Matrix4, Vector3};
use crate::tessellation::{split_components, Tessellator, TriangleMesh};
use crate::topology::{KernelMesh, SolidId, TopologyStore};

use super::advanced_brep::AdvancedBRepBuilder;
use super::body::{
    BodyData, FragmentGeometry, GeometryFragment, RepresentationItem, RepresentationKind, RepresentationType,
};
use super::closure::check_mesh;
use super::extrusion::ExtrusionBuilder;
use super::facet::{is_polyhedral, polyhedral_facets, FacetSet};
use super::facet_merge::FacetMerger;
use super::material::{ElementId, MaterialBinding, MaterialColorResolver, MaterialContext, StyleCache};
use super::options::ExportOptions;
use super::swept::SweptSolidBuilder;

/// Everything an export needs besides the fragments themselves.
///
/// The style cache lives here rather than in a global so that exports into
/// different documents stay independent.
pub struct ExportContext<'a> {
    pub store: &'a TopologyStore,
    pub materials: &'a MaterialContext,
    pub options: ExportOptions,
    styles: StyleCache,
}

impl<'a> ExportContext<'a> {
    #[must_use]
    pub fn new(store: &'a TopologyStore, materials: &'a MaterialContext, options: ExportOptions) -> Self {
        Self {
            store,
            materials,
            options,
            styles: StyleCache::new(),
        }
    }

    /// Distance under which two points are one vertex.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.options.vertex_tolerance.unwrap_or_else(|| self.store.vertex_tolerance())
    }

    fn shift(&self) -> Vector3 {
        self.options.local_origin.map_or_else(Vector3::zeros, |o| o.coords)
    }
}

/// Which strategies a batch may use. Modes only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CascadeMode {
    /// Every strategy.
    Full,
    /// Swept encodings are revoked: every fragment is exported as a BRep
    /// or tessellation.
    NoSweeps,
    /// Every fragment becomes a surface model.
    SurfaceOnly,
}

impl CascadeMode {
    /// The mode a batch with these items must be exported in.
    #[must_use]
    pub fn required_by(items: &[RepresentationItem], allow_mixed_solid_models: bool) -> Self {
        let surfaces = items.iter().any(|i| i.kind == RepresentationKind::SurfaceModel);
        let solids = items.iter().any(|i| i.kind != RepresentationKind::SurfaceModel);
        if surfaces && solids {
            return Self::SurfaceOnly;
        }
        let sweeps = items.iter().any(|i| i.kind.is_sweep());
        let breps = items.iter().any(|i| !i.kind.is_sweep());
        if sweeps && breps && !allow_mixed_solid_models {
            Self::NoSweeps
        } else {
            Self::Full
        }
    }
}

/// Exports the fragments of one element body.
///
/// If the committed items of a batch cannot share one body representation
/// (a surface model next to solids, or sweeps next to BReps when mixing is
/// not allowed) the whole batch is rolled back and exported again in a more
/// restrictive [`CascadeMode`].
pub struct ExportBody<'f> {
    fragments: &'f [GeometryFragment],
    element: Option<ElementId>,
}

impl<'f> ExportBody<'f> {
    #[must_use]
    pub fn new(fragments: &'f [GeometryFragment]) -> Self {
        Self {
            fragments,
            element: None,
        }
    }

    /// Names the element whose material parameters apply to unpainted
    /// geometry.
    #[must_use]
    pub fn for_element(mut self, element: ElementId) -> Self {
        self.element = Some(element);
        self
    }

    /// Runs the cascade over every fragment.
    ///
    /// Fragments that no strategy can encode are listed in
    /// [`BodyData::skipped`].
    ///
    /// # Errors
    ///
    /// Returns the first unexpected (non-recoverable) error; nothing is left
    /// in the document in that case.
    pub fn execute(&self, ctx: &mut ExportContext<'_>, doc: &mut Document) -> ExportResult<BodyData> {
        let mut tessellations: BTreeMap<usize, Vec<TriangleMesh>> = BTreeMap::new();
        let bindings = self
            .fragments
            .iter()
            .map(|f| self.binding(ctx, f))
            .collect::<ExportResult<Vec<_>>>()?;
        let mut mode = CascadeMode::Full;
        loop {
            let mut batch = doc.transaction();
            let mut body = BodyData::default();
            for (index, fragment) in self.fragments.iter().enumerate() {
                let mut run = FragmentRun {
                    ctx: &mut *ctx,
                    fragment,
                    tessellation: &mut tessellations,
                    index,
                };
                match run.cascade(&mut batch, mode, &bindings[index])? {
                    Some(item) => body.items.push(item),
                    None => {
                        warn!(index, "no representation could encode the fragment; skipped");
                        body.skipped.push(index);
                    }
                }
            }
            let required = mode.max(CascadeMode::required_by(&body.items, ctx.options.allow_mixed_solid_models));
            if required != mode {
                warn!(from = ?mode, to = ?required, "items cannot share one body; restarting the batch");
                mode = required;
                continue;
            }
            batch.commit();

            body.representation_type = RepresentationType::combine(body.items.iter().map(|i| i.representation_type));
            body.material_ids = body.items.iter().filter_map(|i| i.material.material).collect();
            body.material_ids.sort_unstable();
            body.material_ids.dedup();
            body.offset_transform = ctx.options.local_origin.map(|o| Matrix4::new_translation(&o.coords));
            debug!(items = body.items.len(), skipped = body.skipped.len(), ?mode, "body exported");
            return Ok(body);
        }
    }

    fn binding(&self, ctx: &ExportContext<'_>, fragment: &GeometryFragment) -> ExportResult<MaterialBinding> {
        let resolver = MaterialColorResolver::new(ctx.materials);
        match &fragment.geometry {
            FragmentGeometry::Mesh(mesh) => Ok(resolver.binding(mesh.material, self.element)),
            FragmentGeometry::Solid(solid) => {
                let faces = ctx.store.solid_faces(*solid)?;
                match resolver.resolve_faces(ctx.store, &faces, self.element) {
                    Ok(binding) => Ok(binding),
                    Err(e) if e.is_recoverable() => {
                        debug!(error = %e, "face areas unavailable; using element material");
                        Ok(resolver.binding(None, self.element))
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }
}

/// The strategies a fragment is eligible for, in cascade order.
#[must_use]
pub fn eligible_strategies(
    options: &ExportOptions,
    fragment: &GeometryFragment,
    mode: CascadeMode,
) -> Vec<RepresentationKind> {
    use RepresentationKind as K;

    if mode == CascadeMode::SurfaceOnly {
        return vec![K::SurfaceModel];
    }
    let schema = options.schema;
    let exact = !options.triangulated_only;
    let solid = matches!(fragment.geometry, FragmentGeometry::Solid(_));
    let mut kinds = Vec::new();
    if exact && mode == CascadeMode::Full && schema.allows_swept_solid() {
        if solid {
            kinds.push(K::Extrusion);
        }
        if fragment
            .sweep
            .as_ref()
            .is_some_and(|hint| !hint.is_advanced() || schema.allows_advanced_brep())
        {
            kinds.push(K::SweptSolid);
        }
    }
    if exact && solid && schema.allows_advanced_brep() {
        kinds.push(K::AdvancedBRep);
    }
    if schema.allows_tessellated_face_set() {
        kinds.push(K::TessellatedFaceSet);
    }
    if schema.allows_faceted_brep() {
        kinds.push(K::FacetedBRep);
    }
    kinds.push(K::SurfaceModel);
    kinds
}

/// State of one fragment's trip through the cascade.
struct FragmentRun<'r, 'a> {
    ctx: &'r mut ExportContext<'a>,
    fragment: &'r GeometryFragment,
    tessellation: &'r mut BTreeMap<usize, Vec<TriangleMesh>>,
    index: usize,
}

impl FragmentRun<'_, '_> {
    fn cascade(
        &mut self,
        doc: &mut Document,
        mode: CascadeMode,
        binding: &MaterialBinding,
    ) -> ExportResult<Option<RepresentationItem>> {
        for kind in eligible_strategies(&self.ctx.options, self.fragment, mode) {
            let mut tx = doc.transaction();
            match self.attempt(&mut tx, kind, binding) {
                Ok(item) => {
                    debug!(index = self.index, ?kind, entities = tx.created(), "strategy committed");
                    tx.commit();
                    return Ok(Some(item));
                }
                Err(e) if e.is_recoverable() => {
                    debug!(index = self.index, ?kind, error = %e, "strategy failed; rolling back");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn attempt(
        &mut self,
        doc: &mut Document,
        kind: RepresentationKind,
        binding: &MaterialBinding,
    ) -> ExportResult<RepresentationItem> {
        let (entities, representation_type) = match kind {
            RepresentationKind::Extrusion => (vec![self.extrusion(doc)?], RepresentationType::SweptSolid),
            RepresentationKind::SweptSolid => self.swept(doc)?,
            RepresentationKind::AdvancedBRep => (vec![self.advanced_brep(doc)?], RepresentationType::AdvancedBrep),
            RepresentationKind::TessellatedFaceSet => (self.face_sets(doc)?, RepresentationType::Tessellation),
            RepresentationKind::FacetedBRep => (self.faceted_breps(doc)?, RepresentationType::Brep),
            RepresentationKind::SurfaceModel => (vec![self.surface_model(doc)?], RepresentationType::SurfaceModel),
        };
        let style = self.ctx.styles.style(doc, self.ctx.materials, binding)?;
        if let Some(style) = style {
            for &item in &entities {
                doc.add(Entity::StyledItem { item, style })?;
            }
        }
        Ok(RepresentationItem {
            kind,
            representation_type,
            entities,
            material: binding.clone(),
            style,
        })
    }

    fn solid(&self) -> ExportResult<SolidId> {
        match self.fragment.geometry {
            FragmentGeometry::Solid(solid) => Ok(solid),
            FragmentGeometry::Mesh(_) => Err(ExportError::NotApplicable("mesh fragments have no exact topology")),
        }
    }

    fn extrusion(&self, doc: &mut Document) -> ExportResult<EntityId> {
        let mut builder = ExtrusionBuilder::new(self.ctx.store, self.ctx.epsilon());
        if let Some(origin) = self.ctx.options.local_origin {
            builder = builder.with_local_origin(origin);
        }
        builder.build(doc, self.solid()?)
    }

    fn swept(&self, doc: &mut Document) -> ExportResult<(Vec<EntityId>, RepresentationType)> {
        let hint = self
            .fragment
            .sweep
            .as_ref()
            .ok_or(ExportError::NotApplicable("fragment carries no sweep"))?;
        let mut builder = SweptSolidBuilder::new(self.ctx.epsilon());
        if let Some(origin) = self.ctx.options.local_origin {
            builder = builder.with_local_origin(origin);
        }
        let kind = if hint.is_advanced() {
            RepresentationType::AdvancedSweptSolid
        } else {
            RepresentationType::SweptSolid
        };
        Ok((vec![builder.build(doc, hint)?], kind))
    }

    fn advanced_brep(&self, doc: &mut Document) -> ExportResult<EntityId> {
        let mut builder = AdvancedBRepBuilder::new(self.ctx.store, self.ctx.epsilon());
        if let Some(origin) = self.ctx.options.local_origin {
            builder = builder.with_local_origin(origin);
        }
        builder.build(doc, self.solid()?)
    }

    /// One closed triangulated face set per shell component.
    fn face_sets(&mut self, doc: &mut Document) -> ExportResult<Vec<EntityId>> {
        let shift = self.ctx.shift();
        let components = self.components()?;
        if let Some(open) = components.iter().position(|c| !check_mesh(&c.indices).closed) {
            return Err(ExportError::Topology(format!("shell component {open} is not closed")));
        }
        components
            .iter()
            .map(|c| {
                doc.add(Entity::TriangulatedFaceSet {
                    coordinates: c.vertices.iter().map(|p| p - shift).collect(),
                    indices: c.indices.clone(),
                    closed: true,
                })
            })
            .collect()
    }

    /// One faceted BRep per closed shell; exact polygons when the solid is
    /// polyhedral, merged tessellation facets otherwise.
    fn faceted_breps(&mut self, doc: &mut Document) -> ExportResult<Vec<EntityId>> {
        let shift = self.ctx.shift();
        let sets = match self.exact_facets()? {
            Some(set) => vec![set],
            None => self.facet_sets()?,
        };
        if let Some(open) = sets.iter().position(|s| !s.is_closed) {
            return Err(ExportError::Topology(format!("faceted shell {open} is not closed")));
        }
        let mut breps = Vec::with_capacity(sets.len());
        for set in &sets {
            let outer = set.emit_shell(doc, &shift)?;
            breps.push(doc.add(Entity::FacetedBrep { outer })?);
        }
        Ok(breps)
    }

    fn surface_model(&mut self, doc: &mut Document) -> ExportResult<EntityId> {
        let shift = self.ctx.shift();
        let sets = self.facet_sets()?;
        if sets.is_empty() {
            return Err(ExportError::GeometryExtraction("fragment has no triangles".into()));
        }
        let mut shells = Vec::with_capacity(sets.len());
        for set in &sets {
            shells.push(set.emit_shell(doc, &shift)?);
        }
        doc.add(Entity::ShellBasedSurfaceModel { shells })
    }

    fn exact_facets(&self) -> ExportResult<Option<FacetSet>> {
        if self.ctx.options.triangulated_only {
            return Ok(None);
        }
        let FragmentGeometry::Solid(solid) = self.fragment.geometry else {
            return Ok(None);
        };
        let store = self.ctx.store;
        if !store.solid(solid)?.inner_shells.is_empty() {
            return Ok(None);
        }
        let faces = store.solid_faces(solid)?;
        if !is_polyhedral(store, &faces)? {
            return Ok(None);
        }
        match polyhedral_facets(store, &faces, self.ctx.epsilon()) {
            Ok(set) if set.is_closed => Ok(Some(set)),
            Ok(_) => Ok(None),
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "exact facets unavailable; tessellating");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Facets of every shell component: merged, or one per triangle in
    /// triangulated-only exports.
    fn facet_sets(&mut self) -> ExportResult<Vec<FacetSet>> {
        let triangulated_only = self.ctx.options.triangulated_only;
        let merger = FacetMerger::new(self.ctx.epsilon(), self.ctx.options.caps.merge_bucket_cap);
        Ok(self
            .components()?
            .iter()
            .map(|c| {
                if triangulated_only {
                    FacetSet::from_triangles(c)
                } else {
                    merger.merge(c)
                }
            })
            .collect())
    }

    /// Connected shell components of the fragment's tessellation, computed
    /// once per fragment and export.
    fn components(&mut self) -> ExportResult<&[TriangleMesh]> {
        if !self.tessellation.contains_key(&self.index) {
            let components = match &self.fragment.geometry {
                FragmentGeometry::Solid(solid) => {
                    let options = &self.ctx.options;
                    Tessellator::new(
                        *solid,
                        options.requested_tessellation(),
                        options.level_of_detail,
                        options.triangle_cap(),
                    )
                    .execute(self.ctx.store)
                    .map_err(ExportError::degenerate)?
                    .components
                }
                FragmentGeometry::Mesh(mesh) => weld_mesh(mesh, self.ctx.epsilon(), self.ctx.options.triangle_cap())?,
            };
            self.tessellation.insert(self.index, components);
        }
        Ok(self.tessellation.get(&self.index).map_or(&[][..], Vec::as_slice))
    }
}

/// Welds a raw mesh within `epsilon`, drops collapsed triangles and splits
/// it into connected components.
fn weld_mesh(mesh: &KernelMesh, epsilon: f64, triangle_cap: usize) -> ExportResult<Vec<TriangleMesh>> {
    if !mesh.is_well_formed() {
        return Err(ExportError::DegenerateInput("mesh triangle refers to a missing vertex".into()));
    }
    if mesh.triangles.len() > triangle_cap {
        return Err(ExportError::GeometryExtraction(format!(
            "{} mesh triangles exceed the cap of {triangle_cap}",
            mesh.triangles.len()
        )));
    }
    let mut cache = VertexCache::new(epsilon);
    let welded: Vec<usize> = mesh.vertices.iter().map(|p| cache.insert(*p)).collect();
    let indices: Vec<[usize; 3]> = mesh
        .triangles
        .iter()
        .map(|t| [welded[t[0]], welded[t[1]], welded[t[2]]])
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
        .collect();
    if indices.is_empty() {
        return Err(ExportError::DegenerateInput("mesh has no non-degenerate triangle".into()));
    }
    Ok(split_components(&TriangleMesh {
        vertices: cache.into_points(),
        indices,
    }))
}

/// Result of exporting several elements.
#[derive(Debug, Default)]
pub struct ElementExports {
    pub bodies: BTreeMap<ElementId, BodyData>,
    /// Elements whose export hit an unexpected error; they left nothing in
    /// the document.
    pub failures: Vec<(ElementId, ExportError)>,
}

/// Exports the bodies of several elements into one document.
///
/// A fatal error on one element is logged and recorded; the remaining
/// elements are still exported.
pub fn export_elements(
    ctx: &mut ExportContext<'_>,
    doc: &mut Document,
    elements: &[(ElementId, Vec<GeometryFragment>)],
) -> ElementExports {
    let mut exports = ElementExports::default();
    for (element, fragments) in elements {
        match ExportBody::new(fragments).for_element(*element).execute(ctx, doc) {
            Ok(body) => {
                exports.bodies.insert(*element, body);
            }
            Err(e) => {
                warn!(element = element.0, error = %e, "element export failed");
                exports.failures.push((*element, e));
            }
        }
    }
    exports
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::export::options::SchemaVersion;
    use crate::export::swept::{SweepHint, SweepPath};
    use crate::math::Point3;
    use crate::operations::creation::{MakeBox, MakeCone};
    use crate::topology::MaterialId;
    use RepresentationKind as K;

    fn item(kind: RepresentationKind) -> RepresentationItem {
        RepresentationItem {
            kind,
            representation_type: RepresentationType::Brep,
            entities: Vec::new(),
            material: MaterialBinding::default(),
            style: None,
        }
    }

    #[test]
    fn strategy_order_follows_the_schema() {
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let fragment = GeometryFragment::solid(solid);
        let ifc4 = ExportOptions::default();
        assert_eq!(
            eligible_strategies(&ifc4, &fragment, CascadeMode::Full),
            vec![K::Extrusion, K::AdvancedBRep, K::TessellatedFaceSet, K::FacetedBRep, K::SurfaceModel]
        );
        assert_eq!(
            eligible_strategies(&ifc4, &fragment, CascadeMode::NoSweeps),
            vec![K::AdvancedBRep, K::TessellatedFaceSet, K::FacetedBRep, K::SurfaceModel]
        );
        let reference = ExportOptions::default().with_schema(SchemaVersion::Ifc4ReferenceView);
        assert_eq!(
            eligible_strategies(&reference, &fragment, CascadeMode::Full),
            vec![K::TessellatedFaceSet, K::SurfaceModel]
        );
        let legacy = ExportOptions::default().with_schema(SchemaVersion::Ifc2x3);
        assert_eq!(
            eligible_strategies(&legacy, &fragment, CascadeMode::Full),
            vec![K::Extrusion, K::FacetedBRep, K::SurfaceModel]
        );
        assert_eq!(
            eligible_strategies(&ifc4, &fragment, CascadeMode::SurfaceOnly),
            vec![K::SurfaceModel]
        );
    }

    #[test]
    fn meshes_and_triangulated_exports_skip_exact_strategies() {
        let fragment = GeometryFragment::mesh(KernelMesh::default());
        assert_eq!(
            eligible_strategies(&ExportOptions::default(), &fragment, CascadeMode::Full),
            vec![K::TessellatedFaceSet, K::FacetedBRep, K::SurfaceModel]
        );
        let mut store = TopologyStore::new();
        let solid = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let triangulated = ExportOptions::default().with_triangulated_only(true);
        assert_eq!(
            eligible_strategies(&triangulated, &GeometryFragment::solid(solid), CascadeMode::Full),
            vec![K::TessellatedFaceSet, K::FacetedBRep, K::SurfaceModel]
        );
    }

    #[test]
    fn directrix_sweeps_need_the_advanced_subset() {
        let hint = SweepHint::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            SweepPath::Directrix(vec![Point3::origin(), Point3::new(0.0, 0.0, 1.0)]),
        );
        let fragment = GeometryFragment::mesh(KernelMesh::default()).with_sweep(hint);
        let legacy = ExportOptions::default().with_schema(SchemaVersion::Ifc2x3);
        assert!(!eligible_strategies(&legacy, &fragment, CascadeMode::Full).contains(&K::SweptSolid));
        assert!(eligible_strategies(&ExportOptions::default(), &fragment, CascadeMode::Full).contains(&K::SweptSolid));
    }

    #[test]
    fn required_modes() {
        assert_eq!(CascadeMode::required_by(&[item(K::Extrusion), item(K::Extrusion)], false), CascadeMode::Full);
        assert_eq!(CascadeMode::required_by(&[item(K::Extrusion), item(K::FacetedBRep)], false), CascadeMode::NoSweeps);
        assert_eq!(CascadeMode::required_by(&[item(K::Extrusion), item(K::FacetedBRep)], true), CascadeMode::Full);
        assert_eq!(
            CascadeMode::required_by(&[item(K::AdvancedBRep), item(K::SurfaceModel)], true),
            CascadeMode::SurfaceOnly
        );
        assert_eq!(CascadeMode::required_by(&[item(K::SurfaceModel)], false), CascadeMode::Full);
    }

    #[test]
    fn sweeps_are_revoked_next_to_breps() {
        let mut store = TopologyStore::new();
        let block = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let frustum = MakeCone::new(Point3::new(3.0, 0.0, 0.0), Vector3::z(), 1.0, 0.5, 1.0)
            .execute(&mut store)
            .unwrap();
        let materials = MaterialContext::new();
        let mut ctx = ExportContext::new(&store, &materials, ExportOptions::default());
        let mut doc = Document::new();
        let fragments = [GeometryFragment::solid(block), GeometryFragment::solid(frustum)];
        let body = ExportBody::new(&fragments).execute(&mut ctx, &mut doc).unwrap();
        let kinds: Vec<_> = body.items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![K::AdvancedBRep, K::AdvancedBRep]);
        assert_eq!(body.representation_type, Some(RepresentationType::AdvancedBrep));
        assert!(!doc.iter().any(|(_, e)| e.type_name() == "IfcExtrudedAreaSolid"));
    }

    #[test]
    fn mixed_solid_models_keep_their_sweeps() {
        let mut store = TopologyStore::new();
        let block = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let frustum = MakeCone::new(Point3::new(3.0, 0.0, 0.0), Vector3::z(), 1.0, 0.5, 1.0)
            .execute(&mut store)
            .unwrap();
        let materials = MaterialContext::new();
        let options = ExportOptions::default().with_mixed_solid_models(true);
        let mut ctx = ExportContext::new(&store, &materials, options);
        let mut doc = Document::new();
        let fragments = [GeometryFragment::solid(block), GeometryFragment::solid(frustum)];
        let body = ExportBody::new(&fragments).execute(&mut ctx, &mut doc).unwrap();
        let kinds: Vec<_> = body.items.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![K::Extrusion, K::AdvancedBRep]);
        assert_eq!(body.representation_type, Some(RepresentationType::SolidModel));
    }

    #[test]
    fn vertex_tolerance_can_be_overridden() {
        let store = TopologyStore::with_vertex_tolerance(1e-3);
        let materials = MaterialContext::new();
        let ctx = ExportContext::new(&store, &materials, ExportOptions::default());
        assert!((ctx.epsilon() - 1e-3).abs() < 1e-15);
        let ctx = ExportContext::new(&store, &materials, ExportOptions::default().with_vertex_tolerance(0.01));
        assert!((ctx.epsilon() - 0.01).abs() < 1e-15);
    }

    #[test]
    fn open_meshes_turn_the_body_into_surfaces() {
        let mut store = TopologyStore::new();
        let block = MakeBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0)).execute(&mut store).unwrap();
        let sheet = KernelMesh::new(
            vec![
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
                Point3::new(6.0, 1.0, 0.0),
                Point3::new(5.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .with_material(MaterialId(4));
        let materials = MaterialContext::new();
        let mut ctx = ExportContext::new(&store, &materials, ExportOptions::default());
        let mut doc = Document::new();
        let fragments = [GeometryFragment::solid(block), GeometryFragment::mesh(sheet)];
        let body = ExportBody::new(&fragments).execute(&mut ctx, &mut doc).unwrap();
        assert!(body.items.iter().all(|i| i.kind == K::SurfaceModel));
        assert_eq!(body.representation_type, Some(RepresentationType::SurfaceModel));
        assert_eq!(body.material_ids, vec![MaterialId(4)]);
        // Only the surviving batch is in the document.
        assert_eq!(doc.iter().filter(|(_, e)| e.type_name() == "IfcShellBasedSurfaceModel").count(), 2);
        assert_eq!(doc.iter().filter(|(_, e)| e.type_name() == "IfcExtrudedAreaSolid").count(), 0);
        assert_eq!(doc.iter().filter(|(_, e)| e.type_name() == "IfcSurfaceStyle").count(), 1);
    }

    #[test]
    fn malformed_meshes_are_skipped() {
        let store = TopologyStore::new();
        let materials = MaterialContext::new();
        let mut ctx = ExportContext::new(&store, &materials, ExportOptions::default());
        let mut doc = Document::new();
        let broken = KernelMesh::new(vec![Point3::origin()], vec![[0, 1, 2]]);
        let fragments = [GeometryFragment::mesh(broken)];
        let body = ExportBody::new(&fragments).execute(&mut ctx, &mut doc).unwrap();
        assert!(body.is_empty());
        assert_eq!(body.skipped, vec![0]);
        assert!(doc.is_empty());
    }
}
