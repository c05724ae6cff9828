use crate::error::Result;
use crate::geometry::surface::{Cone, Cylinder, NurbsSurfaceData, Plane, Revolution, Ruled, Surface};

use super::wire::WireId;

slotmap::new_key_type! {
    /// Unique identifier for a face in the topology store.
    pub struct FaceId;
}

/// Identifier of a material assigned to kernel faces and meshes.
///
/// Ordered so that ties between materials resolve to the lowest id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u32);

/// The face kinds a kernel body can contain, one variant per surface kind.
#[derive(Debug, Clone)]
pub enum FaceSurface {
    /// A planar face.
    Plane(Plane),
    /// A face on a circular cylinder.
    Cylinder(Cylinder),
    /// A face on a circular cone.
    Cone(Cone),
    /// A face swept by revolving a profile.
    Revolved(Revolution),
    /// A face ruled between two rails.
    Ruled(Ruled),
    /// A free-form patch, still in the kernel's raw B-spline form.
    Hermite(NurbsSurfaceData),
}

impl FaceSurface {
    /// Short name of the face kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Plane(_) => "planar",
            Self::Cylinder(_) => "cylindrical",
            Self::Cone(_) => "conical",
            Self::Revolved(_) => "revolved",
            Self::Ruled(_) => "ruled",
            Self::Hermite(_) => "hermite",
        }
    }

    /// Runs `f` against an evaluable view of the surface.
    ///
    /// # Errors
    ///
    /// Returns an error if a free-form patch does not validate, or whatever
    /// `f` returns.
    pub fn with_surface<R>(&self, f: impl FnOnce(&dyn Surface) -> Result<R>) -> Result<R> {
        match self {
            Self::Plane(s) => f(s),
            Self::Cylinder(s) => f(s),
            Self::Cone(s) => f(s),
            Self::Revolved(s) => f(s),
            Self::Ruled(s) => f(s),
            Self::Hermite(data) => f(&data.validate()?),
        }
    }
}

/// A bounded region of a surface.
#[derive(Debug, Clone)]
pub struct FaceData {
    /// The geometric surface on which this face lies.
    pub surface: FaceSurface,
    /// The outer boundary wire.
    pub outer_wire: WireId,
    /// Inner boundary wires (holes).
    pub inner_wires: Vec<WireId>,
    /// If `true`, the outward face normal agrees with the surface normal.
    pub same_sense: bool,
    /// Material painted on the face, if any.
    pub material: Option<MaterialId>,
}
