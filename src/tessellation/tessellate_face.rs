use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};

use crate::error::{Result, TessellationError};
use crate::geometry::surface::Surface;
use crate::math::polygon_3d::point_in_polygon_2d;
use crate::math::{Point2, Point3};
use crate::topology::{FaceId, FaceSurface, TopologyStore};

use super::tessellate_edge::{polyline_segments, sample_edge_use};
use super::{TessellationParams, TriangleMesh};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Coarse search grid for projecting boundary points onto free-form surfaces.
const PROJECTION_GRID: usize = 16;
/// Gauss-Newton refinement steps after the grid search.
const PROJECTION_STEPS: usize = 24;
/// Probe points per iso-curve when estimating interior grid density.
const ISO_PROBES: usize = 24;

/// Tessellates a face into a triangle mesh.
///
/// Boundary loops are sampled edge by edge, mapped into the surface's
/// parameter plane and triangulated there with a constrained Delaunay
/// triangulation. Curved faces get extra interior points on a grid sized
/// by the chord tolerance; boundary points keep their exact edge positions
/// so that neighbouring faces meet without cracks.
pub struct TessellateFace {
    face: FaceId,
    params: TessellationParams,
}

impl TessellateFace {
    /// Creates a new `TessellateFace` operation.
    #[must_use]
    pub fn new(face: FaceId, params: TessellationParams) -> Self {
        Self { face, params }
    }

    /// Executes the tessellation, returning a triangle mesh wound
    /// counter-clockwise about the face's outward normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the face cannot be tessellated.
    pub fn execute(&self, store: &TopologyStore) -> Result<TriangleMesh> {
        let face = store.face(self.face)?;
        let mut loops = Vec::new();
        for wire in store.face_wires(self.face)? {
            let mut points = Vec::new();
            for &oe in &store.wire(wire)?.edges {
                points.extend(sample_edge_use(store, oe, &self.params)?);
            }
            loops.push(points);
        }

        let periodic = matches!(
            face.surface,
            FaceSurface::Cylinder(_) | FaceSurface::Cone(_) | FaceSurface::Revolved(_)
        );
        let planar = matches!(face.surface, FaceSurface::Plane(_));
        let same_sense = face.same_sense;
        let params = self.params;

        face.surface.with_surface(|surface| {
            let mut uv_loops = Vec::with_capacity(loops.len());
            for points in &loops {
                let uv = points
                    .iter()
                    .map(|p| to_uv(&face.surface, surface, p))
                    .collect::<Result<Vec<_>>>()?;
                uv_loops.push(if periodic { unwrap_periodic(uv)? } else { uv });
            }
            if periodic {
                align_inner_loops(&mut uv_loops);
            }
            let steiner = if planar {
                Vec::new()
            } else {
                interior_points(surface, &uv_loops, &params)?
            };
            triangulate(surface, &loops, &uv_loops, &steiner, same_sense)
        })
    }
}

/// Maps a point on the face's surface to surface parameters.
fn to_uv(kind: &FaceSurface, surface: &dyn Surface, p: &Point3) -> Result<Point2> {
    let (u, v) = match kind {
        FaceSurface::Plane(s) => s.inverse(p),
        FaceSurface::Cylinder(s) => s.inverse(p),
        FaceSurface::Cone(s) => s.inverse(p),
        FaceSurface::Revolved(_) | FaceSurface::Ruled(_) | FaceSurface::Hermite(_) => project_uv(surface, p)?,
    };
    Ok(Point2::new(u, v))
}

/// Finds the parameters of the surface point closest to `p`: a grid search
/// followed by Gauss-Newton steps with finite-difference derivatives.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn project_uv(surface: &dyn Surface, p: &Point3) -> Result<(f64, f64)> {
    let d = surface.domain();
    if !d.is_bounded() {
        return Err(TessellationError::Failed("cannot project onto an unbounded surface".into()).into());
    }
    let mut best = (d.u_min, d.v_min);
    let mut best_dist = f64::INFINITY;
    for i in 0..=PROJECTION_GRID {
        for j in 0..=PROJECTION_GRID {
            let (u, v) = d.at_fraction(i as f64 / PROJECTION_GRID as f64, j as f64 / PROJECTION_GRID as f64);
            let dist = (surface.evaluate(u, v)? - p).norm_squared();
            if dist < best_dist {
                best_dist = dist;
                best = (u, v);
            }
        }
    }

    let (mut u, mut v) = best;
    let hu = (d.u_max - d.u_min) * 1e-7;
    let hv = (d.v_max - d.v_min) * 1e-7;
    for _ in 0..PROJECTION_STEPS {
        let s = surface.evaluate(u, v)?;
        let r = s - p;
        if r.norm() < 1e-12 {
            break;
        }
        let (ua, ub) = if u + hu <= d.u_max { (u, u + hu) } else { (u - hu, u) };
        let (va, vb) = if v + hv <= d.v_max { (v, v + hv) } else { (v - hv, v) };
        let su = (surface.evaluate(ub, v)? - surface.evaluate(ua, v)?) / hu;
        let sv = (surface.evaluate(u, vb)? - surface.evaluate(u, va)?) / hv;
        let (a11, a12, a22) = (su.dot(&su), su.dot(&sv), sv.dot(&sv));
        let (b1, b2) = (-r.dot(&su), -r.dot(&sv));
        let det = a11 * a22 - a12 * a12;
        if det.abs() < 1e-30 {
            break;
        }
        let du = (b1 * a22 - b2 * a12) / det;
        let dv = (a11 * b2 - a12 * b1) / det;
        u = (u + du).clamp(d.u_min, d.u_max);
        v = (v + dv).clamp(d.v_min, d.v_max);
        if du.abs() < 1e-14 && dv.abs() < 1e-14 {
            break;
        }
    }
    Ok((u, v))
}

/// Makes the angular parameter continuous along a loop.
///
/// A loop that winds around the axis without a seam cannot be flattened
/// into the parameter plane and is rejected.
fn unwrap_periodic(uv: Vec<Point2>) -> Result<Vec<Point2>> {
    let Some(first) = uv.first().copied() else {
        return Ok(uv);
    };
    let mut out = Vec::with_capacity(uv.len());
    out.push(first);
    let mut prev_raw = first.x;
    let mut running = first.x;
    for p in &uv[1..] {
        running += wrap_delta(p.x - prev_raw);
        prev_raw = p.x;
        out.push(Point2::new(running, p.y));
    }
    let closing = running + wrap_delta(first.x - prev_raw);
    if (closing - first.x).abs() > PI {
        return Err(TessellationError::Failed("periodic face has no seam".into()).into());
    }
    Ok(out)
}

fn wrap_delta(delta: f64) -> f64 {
    if delta > PI {
        delta - TAU
    } else if delta < -PI {
        delta + TAU
    } else {
        delta
    }
}

/// Shifts inner loops by whole periods so that they start inside the
/// outer loop's angular range.
fn align_inner_loops(uv_loops: &mut [Vec<Point2>]) {
    let Some((outer, inner)) = uv_loops.split_first_mut() else {
        return;
    };
    let u_min = outer.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    for hole in inner {
        let Some(start) = hole.first().map(|p| p.x) else {
            continue;
        };
        let shift = ((start - u_min) / TAU).floor() * TAU;
        for p in hole.iter_mut() {
            p.x -= shift;
        }
    }
}

/// Interior grid points for curved faces, kept clear of the boundary.
#[allow(clippy::cast_precision_loss)]
fn interior_points(
    surface: &dyn Surface,
    uv_loops: &[Vec<Point2>],
    params: &TessellationParams,
) -> Result<Vec<Point2>> {
    let Some(outer) = uv_loops.first() else {
        return Ok(Vec::new());
    };
    let (mut u0, mut u1, mut v0, mut v1) = (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
    for p in outer {
        u0 = u0.min(p.x);
        u1 = u1.max(p.x);
        v0 = v0.min(p.y);
        v1 = v1.max(p.y);
    }
    let (um, vm) = (f64::midpoint(u0, u1), f64::midpoint(v0, v1));
    let iso = |fixed_u: Option<f64>| -> Result<Vec<Point3>> {
        (0..=ISO_PROBES)
            .map(|i| {
                let f = i as f64 / ISO_PROBES as f64;
                match fixed_u {
                    Some(u) => surface.evaluate(u, v0 + (v1 - v0) * f),
                    None => surface.evaluate(u0 + (u1 - u0) * f, vm),
                }
            })
            .collect()
    };
    let n_u = polyline_segments(&iso(None)?, params);
    let n_v = polyline_segments(&iso(Some(um))?, params);
    if n_u < 2 || n_v < 2 {
        return Ok(Vec::new());
    }

    let du = (u1 - u0) / n_u as f64;
    let dv = (v1 - v0) / n_v as f64;
    let clearance = 0.25 * du.min(dv);
    let mut points = Vec::new();
    for i in 1..n_u {
        for j in 1..n_v {
            let p = Point2::new(u0 + du * i as f64, v0 + dv * j as f64);
            if !point_in_polygon_2d(&p, outer) || uv_loops[1..].iter().any(|hole| point_in_polygon_2d(&p, hole)) {
                continue;
            }
            if uv_loops.iter().all(|l| distance_to_loop(&p, l) > clearance) {
                points.push(p);
            }
        }
    }
    Ok(points)
}

fn distance_to_loop(p: &Point2, polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            let ab = b - a;
            let len_sq = ab.norm_squared();
            let t = if len_sq < f64::EPSILON {
                0.0
            } else {
                ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
            };
            (p - (a + ab * t)).norm()
        })
        .fold(f64::INFINITY, f64::min)
}

/// Runs the CDT in parameter space and lifts the interior triangles back
/// onto the face.
fn triangulate(
    surface: &dyn Surface,
    loops: &[Vec<Point3>],
    uv_loops: &[Vec<Point2>],
    steiner: &[Point2],
    same_sense: bool,
) -> Result<TriangleMesh> {
    let mut cdt = Cdt::new();
    // 3D position per CDT vertex; interior points are evaluated afterwards.
    let mut positions: Vec<Option<Point3>> = Vec::new();

    for (points, uv) in loops.iter().zip(uv_loops) {
        insert_constraint_loop(&mut cdt, &mut positions, points, uv)?;
    }
    for p in steiner {
        let handle = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        let idx = handle.index();
        if positions.len() <= idx {
            positions.resize(idx + 1, None);
        }
        if positions[idx].is_none() {
            positions[idx] = Some(surface.evaluate(p.x, p.y)?);
        }
    }

    let interior = classify_interior_faces(&cdt);
    let mut mesh = TriangleMesh::default();
    let mut vertex_map: Vec<Option<usize>> = vec![None; positions.len()];

    for face_handle in cdt.inner_faces() {
        if !interior.get(face_handle.fix().index()).copied().unwrap_or(false) {
            continue;
        }
        let mut tri = [0usize; 3];
        for (slot, vh) in tri.iter_mut().zip(face_handle.vertices()) {
            let idx = vh.fix().index();
            *slot = match vertex_map.get(idx).copied().flatten() {
                Some(existing) => existing,
                None => {
                    let pos = match positions.get(idx).copied().flatten() {
                        Some(p) => p,
                        None => surface.evaluate(vh.position().x, vh.position().y)?,
                    };
                    let new_idx = mesh.vertices.len();
                    mesh.vertices.push(pos);
                    if vertex_map.len() <= idx {
                        vertex_map.resize(idx + 1, None);
                    }
                    vertex_map[idx] = Some(new_idx);
                    new_idx
                }
            };
        }
        // Parameter-space CCW follows the surface normal.
        if same_sense {
            mesh.indices.push(tri);
        } else {
            mesh.indices.push([tri[0], tri[2], tri[1]]);
        }
    }

    Ok(mesh)
}

/// Inserts a closed polygon as constraint edges into the CDT.
fn insert_constraint_loop(
    cdt: &mut Cdt,
    positions: &mut Vec<Option<Point3>>,
    points: &[Point3],
    uv: &[Point2],
) -> Result<()> {
    if uv.len() < 3 {
        return Err(TessellationError::Failed("constraint loop needs at least 3 points".into()).into());
    }

    let mut handles = Vec::with_capacity(uv.len());
    for (p3, p2) in points.iter().zip(uv) {
        let h = cdt
            .insert(SpadePoint2::new(p2.x, p2.y))
            .map_err(|e: InsertionError| TessellationError::Failed(format!("CDT insert: {e}")))?;
        let idx = h.index();
        if positions.len() <= idx {
            positions.resize(idx + 1, None);
        }
        positions[idx].get_or_insert(*p3);
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if !cdt.can_add_constraint(from, to) {
            return Err(TessellationError::Failed("face boundary intersects itself".into()).into());
        }
        cdt.add_constraint(from, to);
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the boundary by
/// flood fill: crossing a constraint edge flips inside and outside.
fn classify_interior_faces(cdt: &Cdt) -> Vec<bool> {
    let mut depth_map: Vec<Option<u32>> = vec![None; cdt.num_all_faces()];
    let mut queue: VecDeque<(FixedFaceHandle<InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();
    for edge in cdt.directed_edges() {
        if edge.face().fix() != outer_fix {
            continue;
        }
        if let Some(inner) = edge.rev().face().as_inner() {
            let idx = inner.fix().index();
            if depth_map[idx].is_some() {
                continue;
            }
            let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map[idx] = Some(depth);
            queue.push_back((inner.fix(), depth));
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        for edge in cdt.face(face_fix).adjacent_edges() {
            let Some(neighbor) = edge.rev().face().as_inner() else {
                continue;
            };
            let idx = neighbor.fix().index();
            if depth_map[idx].is_some() {
                continue;
            }
            let next = depth + u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
            depth_map[idx] = Some(next);
            queue.push_back((neighbor.fix(), next));
        }
    }

    depth_map.into_iter().map(|d| d.is_some_and(|d| d % 2 == 1)).collect()
}
