mod circle;
mod helix;
mod line;
mod nurbs;

pub use circle::Circle;
pub use helix::Helix;
pub use line::Line;
pub use nurbs::NurbsCurve;

use crate::error::Result;
use crate::math::Point3;

/// Parameter interval of a curve. Unbounded curves use infinite ends and are
/// trimmed by the edges that carry them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveDomain {
    pub t_min: f64,
    pub t_max: f64,
}

impl CurveDomain {
    /// The whole real line.
    pub const UNBOUNDED: Self = Self {
        t_min: f64::NEG_INFINITY,
        t_max: f64::INFINITY,
    };

    #[must_use]
    pub fn new(t_min: f64, t_max: f64) -> Self {
        Self { t_min, t_max }
    }

    /// Moves `t` into the interval.
    #[must_use]
    pub fn clamp(&self, t: f64) -> f64 {
        t.max(self.t_min).min(self.t_max)
    }
}

/// A parametric curve in model space.
pub trait Curve {
    /// Point at parameter `t`.
    ///
    /// # Errors
    ///
    /// Returns an error if evaluation fails.
    fn evaluate(&self, t: f64) -> Result<Point3>;

    fn domain(&self) -> CurveDomain;

    /// Evaluates `segments + 1` evenly spaced parameters from `t0` to `t1`,
    /// both ends included. `t1 < t0` walks the curve backwards.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation error.
    fn sample_range(&self, t0: f64, t1: f64, segments: usize) -> Result<Vec<Point3>> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let f = i as f64 / segments as f64;
                self.evaluate(t0 + (t1 - t0) * f)
            })
            .collect()
    }
}
