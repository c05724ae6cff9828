use crate::error::{OperationError, Result};
use crate::geometry::curve::Line;
use crate::math::{Point3, TOLERANCE};
use crate::topology::{EdgeCurve, EdgeData, OrientedEdge, TopologyStore, VertexData, WireData, WireId};

/// Creates a closed polygonal wire from a sequence of 3D points.
///
/// Every point becomes a new vertex and every side a new line edge, so the
/// wire shares nothing with other topology. Use it for standalone faces;
/// solids that need shared edges are built by [`MakeBox`](super::MakeBox)
/// and friends.
pub struct MakeWire {
    points: Vec<Point3>,
}

impl MakeWire {
    /// Creates a new `MakeWire` operation.
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Executes the operation, creating the wire in the topology store.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than 3 points are given or two consecutive
    /// points coincide.
    pub fn execute(&self, store: &mut TopologyStore) -> Result<WireId> {
        let n = self.points.len();
        if n < 3 {
            return Err(OperationError::InvalidInput("a closed wire needs at least 3 points".into()).into());
        }
        let vertices: Vec<_> = self
            .points
            .iter()
            .map(|p| store.add_vertex(VertexData::new(*p)))
            .collect();
        let mut edges = Vec::with_capacity(n);
        for i in 0..n {
            let j = (i + 1) % n;
            let (a, b) = (self.points[i], self.points[j]);
            let length = (b - a).norm();
            if length < TOLERANCE {
                return Err(OperationError::InvalidInput(format!("wire points {i} and {j} coincide")).into());
            }
            let edge = store.add_edge(EdgeData {
                start: vertices[i],
                end: vertices[j],
                curve: EdgeCurve::Line(Line::through(a, b)?),
                t_start: 0.0,
                t_end: length,
            });
            edges.push(OrientedEdge::new(edge, true));
        }
        Ok(store.add_wire(WireData { edges }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn triangle_wire_is_connected() {
        let mut store = TopologyStore::new();
        let wire = MakeWire::new(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .execute(&mut store)
        .unwrap();
        assert_eq!(store.wire_vertices(wire).unwrap().len(), 3);
    }

    #[test]
    fn duplicate_points_fail() {
        let mut store = TopologyStore::new();
        let result = MakeWire::new(vec![Point3::origin(), Point3::origin(), Point3::new(1.0, 0.0, 0.0)])
            .execute(&mut store);
        assert!(result.is_err());
    }
}
