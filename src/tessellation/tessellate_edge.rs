use crate::error::Result;
use crate::math::Point3;
use crate::topology::{EdgeCurve, EdgeData, OrientedEdge, TopologyStore};

use super::TessellationParams;

/// Number of probe points used to estimate the curvature of free-form curves.
const PROBE_SAMPLES: usize = 32;

/// Number of segments an edge is split into.
///
/// The count depends on the edge alone, so every face sharing the edge sees
/// the same boundary points and the welded mesh stays watertight.
#[must_use]
pub fn edge_segments(edge: &EdgeData, params: &TessellationParams) -> usize {
    let sweep = edge.t_end - edge.t_start;
    match &edge.curve {
        EdgeCurve::Line(_) => 1,
        EdgeCurve::Arc(c) => params.angular_segments(c.radius(), sweep),
        EdgeCurve::Helix(h) => params.angular_segments(h.radius(), sweep),
        EdgeCurve::Nurbs(c) if c.degree() == 1 => {
            let (lo, hi) = (edge.t_start.min(edge.t_end), edge.t_start.max(edge.t_end));
            let spans = c.knots().windows(2).filter(|w| w[1] > w[0] && w[0] >= lo && w[1] <= hi).count();
            spans.max(1)
        }
        EdgeCurve::Nurbs(_) => edge
            .sample(PROBE_SAMPLES)
            .map_or(params.min_segments, |probe| polyline_segments(&probe, params)),
    }
}

/// Estimates how many segments a curve sampled densely as `probe` needs to
/// stay within the chord tolerance. Straight probes need one segment.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn polyline_segments(probe: &[Point3], params: &TessellationParams) -> usize {
    if probe.len() < 3 {
        return 1;
    }
    let length: f64 = probe.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
    let mut max_curvature = 0.0_f64;
    for w in probe.windows(3) {
        let chord = w[2] - w[0];
        let c = chord.norm();
        if c < f64::EPSILON {
            continue;
        }
        let sagitta = (w[1] - w[0]).cross(&chord).norm() / c;
        max_curvature = max_curvature.max(8.0 * sagitta / (c * c));
    }
    if max_curvature * length < 1e-9 {
        return 1;
    }
    let max_chord = (8.0 * params.tolerance / max_curvature).sqrt();
    ((length / max_chord).ceil() as usize).clamp(params.min_segments, params.max_segments)
}

/// Samples an edge use in its traversal direction, excluding the end point
/// (which the next edge use of the loop starts from).
///
/// # Errors
///
/// Returns an error if the edge is missing or its curve cannot be evaluated.
pub fn sample_edge_use(store: &TopologyStore, oe: OrientedEdge, params: &TessellationParams) -> Result<Vec<Point3>> {
    let edge = store.edge(oe.edge)?;
    let n = edge_segments(edge, params);
    let mut points = edge.sample(n)?;
    if !oe.forward {
        points.reverse();
    }
    points.pop();
    Ok(points)
}
