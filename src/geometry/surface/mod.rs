mod cone;
mod cylinder;
mod nurbs;
mod plane;
mod revolution;
mod ruled;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use nurbs::{NurbsSurface, NurbsSurfaceData};
pub use plane::Plane;
pub use revolution::Revolution;
pub use ruled::Ruled;

use crate::error::Result;
use crate::math::{Point3, Vector3};

/// Parameter domain for a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDomain {
    /// Start of the U parameter range.
    pub u_min: f64,
    /// End of the U parameter range.
    pub u_max: f64,
    /// Start of the V parameter range.
    pub v_min: f64,
    /// End of the V parameter range.
    pub v_max: f64,
}

impl SurfaceDomain {
    /// Creates a new surface domain.
    #[must_use]
    pub fn new(u_min: f64, u_max: f64, v_min: f64, v_max: f64) -> Self {
        Self {
            u_min,
            u_max,
            v_min,
            v_max,
        }
    }

    /// Maps fractions `(fu, fv)` in `[0, 1]` onto the domain.
    ///
    /// Only meaningful for bounded domains.
    #[must_use]
    pub fn at_fraction(&self, fu: f64, fv: f64) -> (f64, f64) {
        (
            self.u_min + (self.u_max - self.u_min) * fu,
            self.v_min + (self.v_max - self.v_min) * fv,
        )
    }

    /// Returns `true` if both parameter ranges are finite.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.u_min.is_finite() && self.u_max.is_finite() && self.v_min.is_finite() && self.v_max.is_finite()
    }
}

/// Trait for parametric surfaces in 3D space.
pub trait Surface {
    /// Evaluates the surface at parameters `(u, v)`, returning the 3D point.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are out of range or evaluation fails.
    fn evaluate(&self, u: f64, v: f64) -> Result<Point3>;

    /// Computes the unit parametric normal `dP/du x dP/dv` at `(u, v)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is degenerate at the given parameters.
    fn normal(&self, u: f64, v: f64) -> Result<Vector3>;

    /// Returns the parameter domain of the surface.
    fn domain(&self) -> SurfaceDomain;

    /// Returns `true` if `u` closes on itself over its domain.
    fn is_u_periodic(&self) -> bool {
        false
    }
}

/// Computes a unit normal from finite differences of `evaluate`.
///
/// Across the seam of a periodic `u` the central difference wraps around
/// the period; at the ends of an open range a second-order one-sided
/// stencil replaces it.
pub(crate) fn numeric_normal(surface: &dyn Surface, u: f64, v: f64) -> Result<Vector3> {
    use crate::error::GeometryError;
    use crate::math::TOLERANCE;

    let d = surface.domain();
    let hu = ((d.u_max - d.u_min).abs() * 1e-6).max(1e-9);
    let hv = ((d.v_max - d.v_min).abs() * 1e-6).max(1e-9);
    let u_wraps = surface.is_u_periodic();
    let du = partial(u, hu, d.u_min, d.u_max, u_wraps, |t| surface.evaluate(t, v))?;
    let dv = partial(v, hv, d.v_min, d.v_max, false, |t| surface.evaluate(u, t))?;
    let n = du.cross(&dv);
    let len = n.norm();
    if len < TOLERANCE * TOLERANCE {
        return Err(GeometryError::Degenerate("surface normal is singular".into()).into());
    }
    Ok(n / len)
}

/// Derivative of `f` at `t` with step `h` on `[lo, hi]`.
fn partial(t: f64, h: f64, lo: f64, hi: f64, wraps: bool, f: impl Fn(f64) -> Result<Point3>) -> Result<Vector3> {
    let wrap = |x: f64| lo + (x - lo).rem_euclid(hi - lo);
    if wraps {
        return Ok((f(wrap(t + h))? - f(wrap(t - h))?) / (2.0 * h));
    }
    if t - h < lo {
        let (at, near, far) = (f(t)?, f(t + h)?, f(t + 2.0 * h)?);
        return Ok((near - at) * 2.0 / h - (far - at) / (2.0 * h));
    }
    if t + h > hi {
        let (at, near, far) = (f(t)?, f(t - h)?, f(t - 2.0 * h)?);
        return Ok((at - near) * 2.0 / h - (at - far) / (2.0 * h));
    }
    Ok((f(t + h)? - f(t - h)?) / (2.0 * h))
}
