use crate::error::{GeometryError, Result};
use crate::math::nurbs::{curve_point, is_valid_knot_vector};
use crate::math::{Point3, TOLERANCE};

use super::{Curve, CurveDomain};

/// A (possibly rational) B-spline curve with a full knot vector.
#[derive(Debug, Clone)]
pub struct NurbsCurve {
    degree: usize,
    knots: Vec<f64>,
    control_points: Vec<Point3>,
    weights: Option<Vec<f64>>,
}

impl NurbsCurve {
    /// Creates a new B-spline curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the knot vector does not match the degree and
    /// control point count, or the weights are missing entries.
    pub fn new(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<Point3>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self> {
        if degree == 0 || control_points.len() <= degree {
            return Err(GeometryError::Degenerate(
                "B-spline curve needs at least degree + 1 control points".into(),
            )
            .into());
        }
        if !is_valid_knot_vector(&knots, degree, control_points.len()) {
            return Err(GeometryError::Degenerate("invalid B-spline knot vector".into()).into());
        }
        if weights
            .as_ref()
            .is_some_and(|w| w.len() != control_points.len() || w.iter().any(|&x| x <= 0.0))
        {
            return Err(GeometryError::Degenerate("invalid B-spline weights".into()).into());
        }
        Ok(Self {
            degree,
            knots,
            control_points,
            weights,
        })
    }

    /// Creates a degree-1 curve through two points on the domain `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn segment(start: Point3, end: Point3) -> Result<Self> {
        if (end - start).norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Self::new(1, vec![0.0, 0.0, 1.0, 1.0], vec![start, end], None)
    }

    /// Returns the degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the full knot vector.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Returns the control points.
    #[must_use]
    pub fn control_points(&self) -> &[Point3] {
        &self.control_points
    }

    /// Returns the weights, if the curve is rational.
    #[must_use]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Returns `true` if `other` has the same degree and knots, i.e. the two
    /// curves share a parametrization.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.degree == other.degree
            && self.control_points.len() == other.control_points.len()
            && self
                .knots
                .iter()
                .zip(&other.knots)
                .all(|(a, b)| (a - b).abs() < 1e-9)
    }
}

impl Curve for NurbsCurve {
    fn evaluate(&self, t: f64) -> Result<Point3> {
        let t = self.domain().clamp(t);
        Ok(curve_point(
            self.degree,
            &self.knots,
            &self.control_points,
            self.weights.as_deref(),
            t,
        ))
    }

    fn domain(&self) -> CurveDomain {
        CurveDomain::new(
            self.knots[self.degree],
            self.knots[self.knots.len() - self.degree - 1],
        )
    }
}
