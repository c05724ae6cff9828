use super::{Point3, Vector3};

/// Tolerance under which two knot values are treated as one.
pub const KNOT_TOLERANCE: f64 = 1e-9;

/// Finds the knot span index containing `u` (The NURBS Book, A2.1).
///
/// `n` is the index of the last control point.
#[must_use]
pub fn find_span(n: usize, degree: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[degree] {
        return degree;
    }
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Computes the non-vanishing basis functions at `u` (The NURBS Book, A2.2).
#[must_use]
pub fn basis_functions(span: usize, u: f64, degree: usize, knots: &[f64]) -> Vec<f64> {
    let mut values = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    values[0] = 1.0;
    for j in 1..=degree {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom.abs() < f64::EPSILON {
                0.0
            } else {
                values[r] / denom
            };
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }
    values
}

/// Returns `true` if the knot vector is non-decreasing and has
/// `n_ctrl + degree + 1` entries.
#[must_use]
pub fn is_valid_knot_vector(knots: &[f64], degree: usize, n_ctrl: usize) -> bool {
    knots.len() == n_ctrl + degree + 1 && knots.windows(2).all(|w| w[1] >= w[0])
}

/// Collapses repeated knot values into `(values, multiplicities)`.
///
/// Consecutive values closer than `tol` are merged; the first occurrence is
/// kept as the representative value.
#[must_use]
pub fn collapse_knots(knots: &[f64], tol: f64) -> (Vec<f64>, Vec<usize>) {
    let mut values: Vec<f64> = Vec::new();
    let mut multiplicities: Vec<usize> = Vec::new();
    for &k in knots {
        match values.last() {
            Some(&last) if (k - last).abs() < tol => {
                if let Some(m) = multiplicities.last_mut() {
                    *m += 1;
                }
            }
            _ => {
                values.push(k);
                multiplicities.push(1);
            }
        }
    }
    (values, multiplicities)
}

/// Expands `(values, multiplicities)` back into a full knot vector.
#[must_use]
pub fn expand_knots(values: &[f64], multiplicities: &[usize]) -> Vec<f64> {
    values
        .iter()
        .zip(multiplicities)
        .flat_map(|(&v, &m)| std::iter::repeat_n(v, m))
        .collect()
}

/// Evaluates a (possibly rational) B-spline curve at `u`.
#[must_use]
pub fn curve_point(
    degree: usize,
    knots: &[f64],
    control_points: &[Point3],
    weights: Option<&[f64]>,
    u: f64,
) -> Point3 {
    let n = control_points.len() - 1;
    let span = find_span(n, degree, u, knots);
    let basis = basis_functions(span, u, degree, knots);
    let mut sum = Vector3::zeros();
    let mut wsum = 0.0;
    for (i, b) in basis.iter().enumerate() {
        let idx = span - degree + i;
        let w = weights.map_or(1.0, |ws| ws[idx]);
        sum += control_points[idx].coords * (b * w);
        wsum += b * w;
    }
    if wsum.abs() < f64::EPSILON {
        return Point3::from(sum);
    }
    Point3::from(sum / wsum)
}

/// Evaluates a (possibly rational) B-spline surface at `(u, v)`.
///
/// Control points are stored row-major: `control_points[i * n_v + j]` with
/// `i` along U and `j` along V.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn surface_point(
    u_degree: usize,
    v_degree: usize,
    u_knots: &[f64],
    v_knots: &[f64],
    n_v: usize,
    control_points: &[Point3],
    weights: Option<&[f64]>,
    u: f64,
    v: f64,
) -> Point3 {
    let n_u = control_points.len() / n_v;
    let u_span = find_span(n_u - 1, u_degree, u, u_knots);
    let v_span = find_span(n_v - 1, v_degree, v, v_knots);
    let nu = basis_functions(u_span, u, u_degree, u_knots);
    let nv = basis_functions(v_span, v, v_degree, v_knots);
    let mut sum = Vector3::zeros();
    let mut wsum = 0.0;
    for (a, bu) in nu.iter().enumerate() {
        let i = u_span - u_degree + a;
        for (b, bv) in nv.iter().enumerate() {
            let j = v_span - v_degree + b;
            let idx = i * n_v + j;
            let w = weights.map_or(1.0, |ws| ws[idx]);
            let f = bu * bv * w;
            sum += control_points[idx].coords * f;
            wsum += f;
        }
    }
    if wsum.abs() < f64::EPSILON {
        return Point3::from(sum);
    }
    Point3::from(sum / wsum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn collapse_clamped_cubic_knots() {
        let knots = [0.0, 0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0, 1.0];
        let (values, mults) = collapse_knots(&knots, KNOT_TOLERANCE);
        assert_eq!(values, vec![0.0, 0.5, 1.0]);
        assert_eq!(mults, vec![4, 1, 4]);
        assert_eq!(expand_knots(&values, &mults), knots.to_vec());
    }

    #[test]
    fn collapse_merges_near_equal_values() {
        let (values, mults) = collapse_knots(&[0.0, 1e-12, 1.0, 1.0], KNOT_TOLERANCE);
        assert_eq!(values.len(), 2);
        assert_eq!(mults, vec![2, 2]);
    }

    #[test]
    fn knot_vector_validation() {
        assert!(is_valid_knot_vector(&[0.0, 0.0, 1.0, 1.0], 1, 2));
        assert!(!is_valid_knot_vector(&[0.0, 0.0, 1.0], 1, 2));
        assert!(!is_valid_knot_vector(&[0.0, 1.0, 0.5, 1.0], 1, 2));
    }

    #[test]
    fn basis_partition_of_unity() {
        let knots = [0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0];
        for &u in &[0.0, 0.2, 0.5, 0.7, 1.0] {
            let span = find_span(3, 2, u, &knots);
            let sum: f64 = basis_functions(span, u, 2, &knots).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn bilinear_patch_evaluates_corners() {
        let knots = [0.0, 0.0, 1.0, 1.0];
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let p = surface_point(1, 1, &knots, &knots, 2, &pts, None, 1.0, 1.0);
        assert_relative_eq!(p, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);
        let mid = surface_point(1, 1, &knots, &knots, 2, &pts, None, 0.5, 0.5);
        assert_relative_eq!(mid, Point3::new(0.5, 0.5, 0.25), epsilon = 1e-12);
    }

    #[test]
    fn linear_curve_midpoint() {
        let knots = [0.0, 0.0, 1.0, 1.0];
        let pts = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        let p = curve_point(1, &knots, &pts, None, 0.5);
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-12);
    }
}
