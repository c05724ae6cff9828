use crate::math::{Point2, Point3, Vector3};
use crate::topology::MaterialId;

use super::EntityId;

/// Placement of a local right-handed coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Origin of the frame.
    pub location: Point3,
    /// Local Z direction (unit).
    pub axis: Vector3,
    /// Local X direction (unit, perpendicular to `axis`).
    pub ref_direction: Vector3,
}

impl Placement {
    /// Creates a placement from its origin and two directions.
    #[must_use]
    pub fn new(location: Point3, axis: Vector3, ref_direction: Vector3) -> Self {
        Self {
            location,
            axis,
            ref_direction,
        }
    }

    /// Local Y direction.
    #[must_use]
    pub fn y_direction(&self) -> Vector3 {
        self.axis.cross(&self.ref_direction)
    }

    /// Expresses a world point in the frame's XY coordinates, dropping Z.
    #[must_use]
    pub fn to_local_2d(&self, p: &Point3) -> Point2 {
        let d = p - self.location;
        Point2::new(d.dot(&self.ref_direction), d.dot(&self.y_direction()))
    }

    /// Expresses a world point in local coordinates.
    #[must_use]
    pub fn point_to_local(&self, p: &Point3) -> Point3 {
        Point3::from(self.direction_to_local(&(p - self.location)))
    }

    /// Expresses a world direction in local coordinates.
    #[must_use]
    pub fn direction_to_local(&self, v: &Vector3) -> Vector3 {
        Vector3::new(v.dot(&self.ref_direction), v.dot(&self.y_direction()), v.dot(&self.axis))
    }
}

/// A closed 2D profile curve.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileCurve {
    /// Closed polyline; the closing segment is implicit.
    Polyline(Vec<Point2>),
    /// Full circle.
    Circle { center: Point2, radius: f64 },
}

/// A planar area bounded by an outer curve and optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDef {
    pub outer: ProfileCurve,
    pub inner: Vec<ProfileCurve>,
}

/// B-spline curve data with collapsed knots.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineCurveData {
    pub degree: usize,
    pub control_points: Vec<Point3>,
    pub knots: Vec<f64>,
    pub multiplicities: Vec<usize>,
    /// Present for rational curves.
    pub weights: Option<Vec<f64>>,
}

/// B-spline surface data with collapsed knots.
///
/// `control_points[i][j]` has `i` along U and `j` along V.
#[derive(Debug, Clone, PartialEq)]
pub struct BSplineSurfaceData {
    pub u_degree: usize,
    pub v_degree: usize,
    pub control_points: Vec<Vec<Point3>>,
    pub u_knots: Vec<f64>,
    pub u_multiplicities: Vec<usize>,
    pub v_knots: Vec<f64>,
    pub v_multiplicities: Vec<usize>,
    /// Present for rational surfaces.
    pub weights: Option<Vec<Vec<f64>>>,
}

/// Curve geometry of an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveGeometry {
    Line { origin: Point3, direction: Vector3 },
    Circle { position: Placement, radius: f64 },
    BSpline(BSplineCurveData),
}

/// Surface geometry of an advanced face.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceGeometry {
    Plane { position: Placement },
    Cylinder { position: Placement, radius: f64 },
    /// `radius` is measured at the placement origin.
    Cone { position: Placement, radius: f64, semi_angle: f64 },
    Revolution { profile: EntityId, axis_origin: Point3, axis: Vector3 },
    LinearExtrusion { profile: EntityId, direction: Vector3, depth: f64 },
    BSpline(BSplineSurfaceData),
}

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    /// The color used when no material is known.
    pub const DEFAULT: Self = Self::new(0.5, 0.5, 0.5);

    #[must_use]
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}

/// One entity of the output document.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    CartesianPoint(Point3),
    VertexPoint {
        point: EntityId,
    },
    Curve(CurveGeometry),
    EdgeCurve {
        start: EntityId,
        end: EntityId,
        curve: EntityId,
        same_sense: bool,
    },
    OrientedEdge {
        edge: EntityId,
        orientation: bool,
    },
    EdgeLoop {
        edges: Vec<EntityId>,
    },
    PolyLoop {
        points: Vec<EntityId>,
    },
    FaceBound {
        bound: EntityId,
        orientation: bool,
        outer: bool,
    },
    Face {
        bounds: Vec<EntityId>,
    },
    AdvancedFace {
        bounds: Vec<EntityId>,
        surface: EntityId,
        same_sense: bool,
    },
    Surface(SurfaceGeometry),
    ClosedShell {
        faces: Vec<EntityId>,
    },
    OpenShell {
        faces: Vec<EntityId>,
    },
    FacetedBrep {
        outer: EntityId,
    },
    AdvancedBrep {
        outer: EntityId,
        voids: Vec<EntityId>,
    },
    ShellBasedSurfaceModel {
        shells: Vec<EntityId>,
    },
    /// Indices are zero-based into `coordinates`.
    TriangulatedFaceSet {
        coordinates: Vec<Point3>,
        indices: Vec<[usize; 3]>,
        closed: bool,
    },
    ExtrudedAreaSolid {
        profile: ProfileDef,
        position: Placement,
        /// Extrusion direction in `position` coordinates (unit).
        direction: Vector3,
        depth: f64,
    },
    RevolvedAreaSolid {
        profile: ProfileDef,
        position: Placement,
        /// Axis of revolution in `position` coordinates, in its XY plane.
        axis_origin: Point3,
        axis: Vector3,
        angle: f64,
    },
    FixedReferenceSweptAreaSolid {
        profile: ProfileDef,
        position: Placement,
        directrix: Vec<Point3>,
        fixed_reference: Vector3,
    },
    SurfaceStyle {
        material: MaterialId,
        name: String,
        color: Color,
        transparency: f64,
    },
    StyledItem {
        item: EntityId,
        style: EntityId,
    },
}

impl Entity {
    /// Schema type name, for logs and diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CartesianPoint(_) => "IfcCartesianPoint",
            Self::VertexPoint { .. } => "IfcVertexPoint",
            Self::Curve(CurveGeometry::Line { .. }) => "IfcLine",
            Self::Curve(CurveGeometry::Circle { .. }) => "IfcCircle",
            Self::Curve(CurveGeometry::BSpline(c)) if c.weights.is_some() => "IfcRationalBSplineCurveWithKnots",
            Self::Curve(CurveGeometry::BSpline(_)) => "IfcBSplineCurveWithKnots",
            Self::EdgeCurve { .. } => "IfcEdgeCurve",
            Self::OrientedEdge { .. } => "IfcOrientedEdge",
            Self::EdgeLoop { .. } => "IfcEdgeLoop",
            Self::PolyLoop { .. } => "IfcPolyLoop",
            Self::FaceBound { outer: true, .. } => "IfcFaceOuterBound",
            Self::FaceBound { .. } => "IfcFaceBound",
            Self::Face { .. } => "IfcFace",
            Self::AdvancedFace { .. } => "IfcAdvancedFace",
            Self::Surface(SurfaceGeometry::Plane { .. }) => "IfcPlane",
            Self::Surface(SurfaceGeometry::Cylinder { .. }) => "IfcCylindricalSurface",
            Self::Surface(SurfaceGeometry::Cone { .. }) => "IfcConicalSurface",
            Self::Surface(SurfaceGeometry::Revolution { .. }) => "IfcSurfaceOfRevolution",
            Self::Surface(SurfaceGeometry::LinearExtrusion { .. }) => "IfcSurfaceOfLinearExtrusion",
            Self::Surface(SurfaceGeometry::BSpline(s)) if s.weights.is_some() => {
                "IfcRationalBSplineSurfaceWithKnots"
            }
            Self::Surface(SurfaceGeometry::BSpline(_)) => "IfcBSplineSurfaceWithKnots",
            Self::ClosedShell { .. } => "IfcClosedShell",
            Self::OpenShell { .. } => "IfcOpenShell",
            Self::FacetedBrep { .. } => "IfcFacetedBrep",
            Self::AdvancedBrep { voids, .. } if !voids.is_empty() => "IfcAdvancedBrepWithVoids",
            Self::AdvancedBrep { .. } => "IfcAdvancedBrep",
            Self::ShellBasedSurfaceModel { .. } => "IfcShellBasedSurfaceModel",
            Self::TriangulatedFaceSet { .. } => "IfcTriangulatedFaceSet",
            Self::ExtrudedAreaSolid { .. } => "IfcExtrudedAreaSolid",
            Self::RevolvedAreaSolid { .. } => "IfcRevolvedAreaSolid",
            Self::FixedReferenceSweptAreaSolid { .. } => "IfcFixedReferenceSweptAreaSolid",
            Self::SurfaceStyle { .. } => "IfcSurfaceStyle",
            Self::StyledItem { .. } => "IfcStyledItem",
        }
    }

    /// Every entity this one refers to.
    #[must_use]
    pub fn references(&self) -> Vec<EntityId> {
        match self {
            Self::VertexPoint { point } => vec![*point],
            Self::EdgeCurve { start, end, curve, .. } => vec![*start, *end, *curve],
            Self::OrientedEdge { edge, .. } => vec![*edge],
            Self::EdgeLoop { edges } => edges.clone(),
            Self::PolyLoop { points } => points.clone(),
            Self::FaceBound { bound, .. } => vec![*bound],
            Self::Face { bounds } => bounds.clone(),
            Self::AdvancedFace { bounds, surface, .. } => {
                let mut refs = bounds.clone();
                refs.push(*surface);
                refs
            }
            Self::Surface(
                SurfaceGeometry::Revolution { profile, .. } | SurfaceGeometry::LinearExtrusion { profile, .. },
            ) => vec![*profile],
            Self::ClosedShell { faces } | Self::OpenShell { faces } => faces.clone(),
            Self::FacetedBrep { outer } => vec![*outer],
            Self::AdvancedBrep { outer, voids } => {
                let mut refs = vec![*outer];
                refs.extend_from_slice(voids);
                refs
            }
            Self::ShellBasedSurfaceModel { shells } => shells.clone(),
            Self::StyledItem { item, style } => vec![*item, *style],
            Self::CartesianPoint(_)
            | Self::Curve(_)
            | Self::Surface(_)
            | Self::TriangulatedFaceSet { .. }
            | Self::ExtrudedAreaSolid { .. }
            | Self::RevolvedAreaSolid { .. }
            | Self::FixedReferenceSweptAreaSolid { .. }
            | Self::SurfaceStyle { .. } => Vec::new(),
        }
    }
}
