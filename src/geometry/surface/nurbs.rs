use crate::error::{GeometryError, Result};
use crate::math::nurbs::{is_valid_knot_vector, surface_point};
use crate::math::{Point3, Vector3};

use super::{numeric_normal, Surface, SurfaceDomain};

/// Unvalidated tensor-product B-spline patch data as handed over by a
/// modeling kernel.
///
/// Control points are given as rows along U, each row running along V.
#[derive(Debug, Clone)]
pub struct NurbsSurfaceData {
    pub u_degree: usize,
    pub v_degree: usize,
    pub u_knots: Vec<f64>,
    pub v_knots: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
    pub weights: Option<Vec<Vec<f64>>>,
}

impl NurbsSurfaceData {
    /// Checks the grid, knots and weights and builds an evaluable surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the control grid is ragged or empty, the knot
    /// vectors do not match the degrees and grid size, or the weights do not
    /// match the grid.
    pub fn validate(&self) -> Result<NurbsSurface> {
        let n_u = self.control_points.len();
        let n_v = self.control_points.first().map_or(0, Vec::len);
        if n_u == 0 || n_v == 0 || self.control_points.iter().any(|row| row.len() != n_v) {
            return Err(GeometryError::Degenerate("ragged or empty control point grid".into()).into());
        }
        if self.u_degree == 0 || self.v_degree == 0 || n_u <= self.u_degree || n_v <= self.v_degree {
            return Err(GeometryError::Degenerate(
                "control point grid is too small for the surface degree".into(),
            )
            .into());
        }
        if !is_valid_knot_vector(&self.u_knots, self.u_degree, n_u)
            || !is_valid_knot_vector(&self.v_knots, self.v_degree, n_v)
        {
            return Err(GeometryError::Degenerate(format!(
                "knot vectors ({}, {}) do not match a {n_u}x{n_v} grid of degree ({}, {})",
                self.u_knots.len(),
                self.v_knots.len(),
                self.u_degree,
                self.v_degree
            ))
            .into());
        }
        let weights = match &self.weights {
            None => None,
            Some(rows) => {
                if rows.len() != n_u || rows.iter().any(|r| r.len() != n_v || r.iter().any(|&w| w <= 0.0)) {
                    return Err(GeometryError::Degenerate("invalid B-spline surface weights".into()).into());
                }
                Some(rows.iter().flatten().copied().collect())
            }
        };
        Ok(NurbsSurface {
            u_degree: self.u_degree,
            v_degree: self.v_degree,
            u_knots: self.u_knots.clone(),
            v_knots: self.v_knots.clone(),
            n_v,
            control_points: self.control_points.iter().flatten().copied().collect(),
            weights,
        })
    }
}

/// A validated (possibly rational) tensor-product B-spline surface.
#[derive(Debug, Clone)]
pub struct NurbsSurface {
    u_degree: usize,
    v_degree: usize,
    u_knots: Vec<f64>,
    v_knots: Vec<f64>,
    n_v: usize,
    control_points: Vec<Point3>,
    weights: Option<Vec<f64>>,
}

impl NurbsSurface {
    /// Returns the degrees `(u, v)`.
    #[must_use]
    pub fn degrees(&self) -> (usize, usize) {
        (self.u_degree, self.v_degree)
    }

    /// Returns the full U knot vector.
    #[must_use]
    pub fn u_knots(&self) -> &[f64] {
        &self.u_knots
    }

    /// Returns the full V knot vector.
    #[must_use]
    pub fn v_knots(&self) -> &[f64] {
        &self.v_knots
    }

    /// Returns the control grid dimensions `(n_u, n_v)`.
    #[must_use]
    pub fn grid_size(&self) -> (usize, usize) {
        (self.control_points.len() / self.n_v, self.n_v)
    }

    /// Iterates over the control point rows along U.
    pub fn control_rows(&self) -> impl Iterator<Item = &[Point3]> {
        self.control_points.chunks(self.n_v)
    }
}

impl Surface for NurbsSurface {
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3> {
        let d = self.domain();
        Ok(surface_point(
            self.u_degree,
            self.v_degree,
            &self.u_knots,
            &self.v_knots,
            self.n_v,
            &self.control_points,
            self.weights.as_deref(),
            u.clamp(d.u_min, d.u_max),
            v.clamp(d.v_min, d.v_max),
        ))
    }

    fn normal(&self, u: f64, v: f64) -> Result<Vector3> {
        numeric_normal(self, u, v)
    }

    fn domain(&self) -> SurfaceDomain {
        let (n_u, n_v) = self.grid_size();
        SurfaceDomain::new(
            self.u_knots[self.u_degree],
            self.u_knots[n_u],
            self.v_knots[self.v_degree],
            self.v_knots[n_v],
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bilinear() -> NurbsSurfaceData {
        NurbsSurfaceData {
            u_degree: 1,
            v_degree: 1,
            u_knots: vec![0.0, 0.0, 1.0, 1.0],
            v_knots: vec![0.0, 0.0, 1.0, 1.0],
            control_points: vec![
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            ],
            weights: None,
        }
    }

    #[test]
    fn flat_patch_normal_follows_parametrization() {
        let s = bilinear().validate().unwrap();
        assert_relative_eq!(s.normal(0.5, 0.5).unwrap(), Vector3::z(), epsilon = 1e-9);
        assert_eq!(s.grid_size(), (2, 2));
        assert_eq!(s.control_rows().count(), 2);
    }

    #[test]
    fn grid_and_knot_mismatch_is_rejected() {
        let mut data = bilinear();
        data.control_points[1].pop();
        assert!(data.validate().is_err());

        let mut data = bilinear();
        data.u_knots.push(1.0);
        assert!(data.validate().is_err());
    }
}
