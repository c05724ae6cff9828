use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::operations::shaping::Extrude;
use crate::topology::{SolidId, TopologyStore};

use super::{MakeFace, MakeWire};

/// Creates an axis-aligned box solid from two corner points.
///
/// The box is the extrusion of its bottom rectangle, so its six faces share
/// eight vertices and twelve edges.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, creating the box in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has zero extent along any axis.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<SolidId> {
        let (lo, hi) = (self.min_corner, self.max_corner);
        let size = hi - lo;
        if size.x.abs() < TOLERANCE || size.y.abs() < TOLERANCE || size.z.abs() < TOLERANCE {
            return Err(OperationError::InvalidInput("box must have non-zero extent".into()).into());
        }
        let wire = MakeWire::new(vec![
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
        ])
        .execute(store)?;
        let base = MakeFace::new(wire, vec![]).execute(store)?;
        Extrude::new(base, Vector3::new(0.0, 0.0, size.z)).execute(store)
    }
}
