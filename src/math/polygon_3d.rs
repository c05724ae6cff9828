use super::{Point2, Point3, Vector3, TOLERANCE};

/// Computes the area-weighted normal of a polygon using Newell's method.
///
/// The returned vector is not normalized; its length is twice the polygon
/// area. Returns the zero vector for degenerate input.
#[must_use]
pub fn newell_vector(points: &[Point3]) -> Vector3 {
    let n = points.len();
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let curr = &points[i];
        let next = &points[(i + 1) % n];
        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }
    normal
}

/// Computes the unit normal of a polygon, or `None` if it is degenerate.
#[must_use]
pub fn newell_normal(points: &[Point3]) -> Option<Vector3> {
    let normal = newell_vector(points);
    let len = normal.norm();
    (len > TOLERANCE).then(|| normal / len)
}

/// Computes the area of a planar polygon in 3D.
#[must_use]
pub fn polygon_area(points: &[Point3]) -> f64 {
    newell_vector(points).norm() * 0.5
}

/// Computes the area of a triangle.
#[must_use]
pub fn triangle_area(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    (b - a).cross(&(c - a)).norm() * 0.5
}

/// Projects points into a 2D frame spanned by `u_dir` and `v_dir` at `origin`.
#[must_use]
pub fn project_to_frame(
    points: &[Point3],
    origin: &Point3,
    u_dir: &Vector3,
    v_dir: &Vector3,
) -> Vec<Point2> {
    points
        .iter()
        .map(|p| {
            let d = p - origin;
            Point2::new(d.dot(u_dir), d.dot(v_dir))
        })
        .collect()
}

/// Signed area of a 2D polygon (positive when counter-clockwise).
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Point-in-polygon test by winding number. Non-zero winding is inside.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut winding = 0i32;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let cross = (b.x - a.x) * (point.y - a.y) - (point.x - a.x) * (b.y - a.y);
        if a.y <= point.y {
            if b.y > point.y && cross > 0.0 {
                winding += 1;
            }
        } else if b.y <= point.y && cross < 0.0 {
            winding -= 1;
        }
    }
    winding != 0
}
