use crate::error::Result;
use crate::geometry::curve::{Circle, Curve, Helix, Line, NurbsCurve};
use crate::math::Point3;

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology store.
    pub struct EdgeId;
}

/// The geometric curve carried by a kernel edge.
#[derive(Debug, Clone)]
pub enum EdgeCurve {
    /// A straight segment.
    Line(Line),
    /// A circular arc or full circle.
    Arc(Circle),
    /// A B-spline curve.
    Nurbs(NurbsCurve),
    /// A helix. Kernels produce these for threads and springs; they have no
    /// exact counterpart in the exchange schema.
    Helix(Helix),
}

impl EdgeCurve {
    /// The underlying curve.
    #[must_use]
    pub fn as_curve(&self) -> &dyn Curve {
        match self {
            Self::Line(c) => c,
            Self::Arc(c) => c,
            Self::Nurbs(c) => c,
            Self::Helix(c) => c,
        }
    }

    /// Evaluates the underlying curve.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    pub fn evaluate(&self, t: f64) -> Result<Point3> {
        self.as_curve().evaluate(t)
    }

    /// Short name of the curve kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Line(_) => "line",
            Self::Arc(_) => "arc",
            Self::Nurbs(_) => "nurbs",
            Self::Helix(_) => "helix",
        }
    }
}

/// A kernel edge between two vertices.
///
/// The curve is trimmed to `[t_start, t_end]`; `t_end < t_start` means the
/// edge runs against the curve's parametrization. The edge's own vertices are
/// authoritative, not the evaluated curve ends.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// The geometric curve defining this edge's shape.
    pub curve: EdgeCurve,
    /// Parameter on the curve corresponding to the start vertex.
    pub t_start: f64,
    /// Parameter on the curve corresponding to the end vertex.
    pub t_end: f64,
}

impl EdgeData {
    /// Returns `true` if start and end vertex are the same (full circles,
    /// closed splines).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.start == self.end
    }

    /// Samples `segments + 1` points from start to end along the curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the curve cannot be evaluated.
    pub fn sample(&self, segments: usize) -> Result<Vec<Point3>> {
        self.curve.as_curve().sample_range(self.t_start, self.t_end, segments)
    }
}
