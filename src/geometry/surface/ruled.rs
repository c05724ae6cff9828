use crate::error::{GeometryError, Result};
use crate::geometry::curve::{Curve, NurbsCurve};
use crate::math::{Point3, Vector3, TOLERANCE};

use super::{numeric_normal, NurbsSurfaceData, Surface, SurfaceDomain};

/// A ruled surface between two rail curves.
///
/// `P(u, v) = (1 - v) * c0(u) + v * c1(u)` with both rails reparametrized
/// onto `u` in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Ruled {
    rail0: NurbsCurve,
    rail1: NurbsCurve,
}

impl Ruled {
    /// Creates a ruled surface from two rails.
    #[must_use]
    pub fn new(rail0: NurbsCurve, rail1: NurbsCurve) -> Self {
        Self { rail0, rail1 }
    }

    /// Returns the first rail (`v = 0`).
    #[must_use]
    pub fn rail0(&self) -> &NurbsCurve {
        &self.rail0
    }

    /// Returns the second rail (`v = 1`).
    #[must_use]
    pub fn rail1(&self) -> &NurbsCurve {
        &self.rail1
    }

    /// Returns `Some(d)` if the second rail is the first one translated by `d`.
    ///
    /// Such a surface is a linear extrusion of `rail0` along `d`.
    #[must_use]
    pub fn translation(&self) -> Option<Vector3> {
        if !self.rail0.is_compatible_with(&self.rail1) || self.rail0.weights() != self.rail1.weights() {
            return None;
        }
        let c0 = self.rail0.control_points();
        let c1 = self.rail1.control_points();
        let d = c1[0] - c0[0];
        if d.norm() < TOLERANCE {
            return None;
        }
        c0.iter()
            .zip(c1)
            .all(|(a, b)| ((b - a) - d).norm() < 1e-9)
            .then_some(d)
    }

    /// Converts the surface into an exact tensor-product B-spline patch of
    /// degree `(p, 1)`, with the U knots rescaled onto `[0, 1]`.
    ///
    /// Returns `None` when the rails do not share degree, knots and weights.
    #[must_use]
    pub fn to_nurbs(&self) -> Option<NurbsSurfaceData> {
        if !self.rail0.is_compatible_with(&self.rail1) || self.rail0.weights() != self.rail1.weights() {
            return None;
        }
        let knots = self.rail0.knots();
        let (k0, k1) = (knots[0], knots[knots.len() - 1]);
        let span = k1 - k0;
        if span < TOLERANCE {
            return None;
        }
        let u_knots = knots.iter().map(|k| (k - k0) / span).collect();
        let control_points = self
            .rail0
            .control_points()
            .iter()
            .zip(self.rail1.control_points())
            .map(|(a, b)| vec![*a, *b])
            .collect();
        let weights = self
            .rail0
            .weights()
            .map(|w| w.iter().map(|&x| vec![x, x]).collect());
        Some(NurbsSurfaceData {
            u_degree: self.rail0.degree(),
            v_degree: 1,
            u_knots,
            v_knots: vec![0.0, 0.0, 1.0, 1.0],
            control_points,
            weights,
        })
    }

    fn rail_point(rail: &NurbsCurve, u: f64) -> Result<Point3> {
        let d = rail.domain();
        rail.evaluate(d.t_min + (d.t_max - d.t_min) * u)
    }
}

impl Surface for Ruled {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        if !(0.0..=1.0).contains(&v) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "v",
                value: v,
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        let a = Self::rail_point(&self.rail0, u)?;
        let b = Self::rail_point(&self.rail1, u)?;
        Ok(a + (b - a) * v)
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        numeric_normal(self, u, v)
    }

    fn domain(&self) -> SurfaceDomain {
        SurfaceDomain::new(0.0, 1.0, 0.0, 1.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadratic(offset: Vector3) -> NurbsCurve {
        NurbsCurve::new(
            2,
            vec![0.0, 0.0, 0.0, 2.0, 2.0, 2.0],
            vec![
                Point3::new(0.0, 0.0, 0.0) + offset,
                Point3::new(1.0, 1.0, 0.0) + offset,
                Point3::new(2.0, 0.0, 0.0) + offset,
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn translated_rails_are_a_linear_extrusion() {
        let s = Ruled::new(quadratic(Vector3::zeros()), quadratic(Vector3::new(0.0, 0.0, 3.0)));
        let d = s.translation().unwrap();
        assert_relative_eq!(d, Vector3::new(0.0, 0.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn nurbs_conversion_matches_evaluation() {
        let s = Ruled::new(quadratic(Vector3::zeros()), quadratic(Vector3::new(0.0, 2.0, 3.0)));
        let patch = s.to_nurbs().unwrap().validate().unwrap();
        for &(u, v) in &[(0.0, 0.0), (0.3, 0.6), (1.0, 1.0)] {
            assert_relative_eq!(
                patch.evaluate(u, v).unwrap(),
                s.evaluate(u, v).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn mismatched_rails_have_no_exact_patch() {
        let line = NurbsCurve::segment(Point3::origin(), Point3::new(2.0, 0.0, 0.0)).unwrap();
        let s = Ruled::new(line, quadratic(Vector3::z()));
        assert!(s.to_nurbs().is_none());
        assert!(s.translation().is_none());
    }
}
