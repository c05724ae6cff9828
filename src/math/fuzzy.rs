use std::collections::BTreeMap;

use super::{Point3, Vector3};

/// Deduplicates points by Euclidean distance.
///
/// Two points closer than `epsilon` share one identity; points exactly
/// `epsilon` apart stay distinct. When several existing points are within
/// range the one inserted first wins.
#[derive(Debug, Clone)]
pub struct VertexCache {
    epsilon: f64,
    points: Vec<Point3>,
    cells: BTreeMap<(i64, i64, i64), Vec<usize>>,
}

impl VertexCache {
    /// Creates an empty cache with the given tolerance.
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.max(f64::MIN_POSITIVE),
            points: Vec::new(),
            cells: BTreeMap::new(),
        }
    }

    /// Returns the tolerance used for matching.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the number of distinct points stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if no point has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the representative position of an identity.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<&Point3> {
        self.points.get(index)
    }

    /// Returns all representative positions in identity order.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Consumes the cache, returning the representative positions.
    #[must_use]
    pub fn into_points(self) -> Vec<Point3> {
        self.points
    }

    /// Looks up an existing identity within tolerance of `point`.
    #[must_use]
    pub fn find(&self, point: &Point3) -> Option<usize> {
        let (cx, cy, cz) = self.cell_of(point);
        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    let Some(candidates) = self.cells.get(&key) else {
                        continue;
                    };
                    for &idx in candidates {
                        if (self.points[idx] - point).norm() < self.epsilon
                            && best.is_none_or(|b| idx < b)
                        {
                            best = Some(idx);
                        }
                    }
                }
            }
        }
        best
    }

    /// Returns the identity of `point`, inserting it if no existing point is
    /// within tolerance.
    pub fn insert(&mut self, point: Point3) -> usize {
        if let Some(idx) = self.find(&point) {
            return idx;
        }
        let idx = self.points.len();
        self.points.push(point);
        let key = self.cell_of(&point);
        self.cells.entry(key).or_default().push(idx);
        idx
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, point: &Point3) -> (i64, i64, i64) {
        (
            (point.x / self.epsilon).floor() as i64,
            (point.y / self.epsilon).floor() as i64,
            (point.z / self.epsilon).floor() as i64,
        )
    }
}

/// A fuzzy key for a supporting plane: unit normal plus signed distance from
/// the origin along that normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneKey {
    /// Unit normal of the plane.
    pub normal: Vector3,
    /// Signed distance of the plane from the world origin along `normal`.
    pub distance: f64,
}

impl PlaneKey {
    /// Creates a key from a unit normal and any point on the plane.
    #[must_use]
    pub fn new(normal: Vector3, point_on_plane: &Point3) -> Self {
        Self {
            normal,
            distance: normal.dot(&point_on_plane.coords),
        }
    }

    /// Returns the projection of the world origin onto the plane.
    #[must_use]
    pub fn origin(&self) -> Point3 {
        Point3::from(self.normal * self.distance)
    }

    /// Returns `true` if both keys describe the same oriented plane within
    /// the given tolerances.
    #[must_use]
    pub fn matches(&self, other: &Self, normal_tol: f64, distance_tol: f64) -> bool {
        self.normal.dot(&other.normal) > 1.0 - normal_tol
            && (self.distance - other.distance).abs() < distance_tol
    }
}
