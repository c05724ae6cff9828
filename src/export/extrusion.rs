use std::f64::consts::TAU;

use tracing::debug;

use crate::document::{Document, Entity, EntityId, Placement, ProfileCurve, ProfileDef};
use crate::error::{ExportError, ExportResult};
use crate::geometry::surface::Plane;
use crate::math::fuzzy::VertexCache;
use crate::math::polygon_3d::signed_area_2d;
use crate::math::{Point2, Point3, Vector3};
use crate::topology::{EdgeCurve, FaceId, FaceSurface, SolidId, TopologyStore, WireId};

use super::facet::partition_loops;

/// Largest `|cos|` between a side face normal and the extrusion direction,
/// and largest deviation of parallel directions from `1`.
const PARALLEL_TOLERANCE: f64 = 1e-9;

/// Recognizes a kernel solid that is a planar profile swept along a straight
/// direction: two opposite planar caps related by a translation, and side
/// faces that are planes or cylinders parallel to that translation.
pub struct ExtrusionBuilder<'a> {
    store: &'a TopologyStore,
    epsilon: f64,
    shift: Vector3,
}

/// A cap pair with the translation carrying the bottom cap onto the top one.
struct Prism<'a> {
    bottom: FaceId,
    plane: &'a Plane,
    outward: Vector3,
    offset: Vector3,
}

impl<'a> ExtrusionBuilder<'a> {
    /// Creates a builder matching vertices within `epsilon`.
    #[must_use]
    pub fn new(store: &'a TopologyStore, epsilon: f64) -> Self {
        Self {
            store,
            epsilon,
            shift: Vector3::zeros(),
        }
    }

    /// Emits coordinates relative to `origin`.
    #[must_use]
    pub fn with_local_origin(mut self, origin: Point3) -> Self {
        self.shift = origin.coords;
        self
    }

    /// Writes the solid as an extruded area solid.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::NotApplicable`] if the solid is not a prism
    /// with a polyline or circular profile, and
    /// [`ExportError::DegenerateInput`] if its profile collapses.
    pub fn build(&self, doc: &mut Document, solid: SolidId) -> ExportResult<EntityId> {
        let data = self.store.solid(solid)?;
        if !data.inner_shells.is_empty() {
            return Err(ExportError::NotApplicable("solid has voids"));
        }
        let faces = self.store.solid_faces(solid)?;
        if self.store.edge_use_counts(&faces)?.values().any(|&n| n != 2) {
            return Err(ExportError::NotApplicable("solid is not closed"));
        }
        let prism = self.find_prism(&faces)?;
        let depth = prism.offset.norm();
        let direction = prism.offset / depth;

        // Profile frame: local Z points into the solid, local X follows the cap plane.
        let frame = Placement::new(*prism.plane.origin(), -prism.outward, *prism.plane.u_dir());
        let profile = self.profile(prism.bottom, prism.plane, &frame)?;
        let local_direction = frame.direction_to_local(&direction);
        let position = Placement::new(frame.location - self.shift, frame.axis, frame.ref_direction);
        debug!(depth, holes = profile.inner.len(), "detected extrusion");
        doc.add(Entity::ExtrudedAreaSolid {
            profile,
            position,
            direction: local_direction,
            depth,
        })
    }

    fn find_prism(&self, faces: &[FaceId]) -> ExportResult<Prism<'a>> {
        let mut caps: Vec<(FaceId, &'a Plane, Vector3)> = Vec::new();
        for &face in faces {
            let data = self.store.face(face)?;
            if let FaceSurface::Plane(plane) = &data.surface {
                let sign = if data.same_sense { 1.0 } else { -1.0 };
                caps.push((face, plane, plane.plane_normal() * sign));
            }
        }
        for &(bottom, plane, outward) in &caps {
            for &(top, _, top_outward) in &caps {
                if top == bottom || outward.dot(&top_outward) > -1.0 + PARALLEL_TOLERANCE {
                    continue;
                }
                let Some(offset) = self.translation(bottom, top, &outward)? else {
                    continue;
                };
                if self.sides_follow(faces, bottom, top, &offset)? {
                    return Ok(Prism {
                        bottom,
                        plane,
                        outward,
                        offset,
                    });
                }
            }
        }
        Err(ExportError::NotApplicable("no pair of translated planar caps"))
    }

    fn face_points(&self, face: FaceId) -> ExportResult<Vec<Point3>> {
        let mut points = Vec::new();
        for wire in self.store.face_wires(face)? {
            for v in self.store.wire_vertices(wire)? {
                points.push(self.store.vertex(v)?.point);
            }
        }
        Ok(points)
    }

    /// The translation mapping every vertex of `bottom` onto a vertex of
    /// `top`, moving away from the bottom cap's outward side.
    fn translation(&self, bottom: FaceId, top: FaceId, outward: &Vector3) -> ExportResult<Option<Vector3>> {
        let from = self.face_points(bottom)?;
        let to = self.face_points(top)?;
        let mut targets = VertexCache::new(self.epsilon);
        for p in &to {
            targets.insert(*p);
        }
        let mut sources = VertexCache::new(self.epsilon);
        for p in &from {
            sources.insert(*p);
        }
        let Some(anchor) = sources.points().first().copied() else {
            return Ok(None);
        };
        if sources.len() != targets.len() {
            return Ok(None);
        }
        for candidate in targets.points() {
            let offset = candidate - anchor;
            if offset.dot(outward) >= -self.epsilon {
                continue;
            }
            if sources.points().iter().all(|p| targets.find(&(p + offset)).is_some()) {
                return Ok(Some(offset));
            }
        }
        Ok(None)
    }

    /// Every face other than the caps is a plane or cylinder running along
    /// `offset`, one per bottom cap edge.
    fn sides_follow(&self, faces: &[FaceId], bottom: FaceId, top: FaceId, offset: &Vector3) -> ExportResult<bool> {
        let direction = offset.normalize();
        let mut cap_edges = 0;
        for wire in self.store.face_wires(bottom)? {
            cap_edges += self.store.wire(wire)?.edges.len();
        }
        let mut sides = 0;
        for &face in faces {
            if face == bottom || face == top {
                continue;
            }
            let surface = &self.store.face(face)?.surface;
            let parallel = match surface {
                FaceSurface::Plane(plane) => plane.plane_normal().dot(&direction).abs() < PARALLEL_TOLERANCE,
                FaceSurface::Cylinder(cyl) => cyl.axis().dot(&direction).abs() > 1.0 - PARALLEL_TOLERANCE,
                _ => false,
            };
            if !parallel {
                debug!(kind = surface.kind_name(), "side face does not run along the extrusion");
                return Ok(false);
            }
            sides += 1;
        }
        Ok(sides == cap_edges)
    }

    fn profile(&self, cap: FaceId, plane: &Plane, frame: &Placement) -> ExportResult<ProfileDef> {
        let wires = self.store.face_wires(cap)?;
        let mut curves = Vec::with_capacity(wires.len());
        for &wire in &wires {
            curves.push(self.profile_curve(wire, plane, frame)?);
        }
        let outlines: Vec<Vec<Point2>> = curves.iter().map(outline).collect();
        let groups = partition_loops(&outlines);
        let [(outer, holes)] = groups.as_slice() else {
            return Err(ExportError::NotApplicable("profile has several regions"));
        };
        Ok(ProfileDef {
            outer: oriented(curves[*outer].clone(), true),
            inner: holes.iter().map(|&h| oriented(curves[h].clone(), false)).collect(),
        })
    }

    fn profile_curve(&self, wire: WireId, plane: &Plane, frame: &Placement) -> ExportResult<ProfileCurve> {
        let edges = &self.store.wire(wire)?.edges;
        let mut all_lines = true;
        for oe in edges {
            all_lines &= matches!(self.store.edge(oe.edge)?.curve, EdgeCurve::Line(_));
        }
        if all_lines {
            let mut points: Vec<Point2> = Vec::new();
            for v in self.store.wire_vertices(wire)? {
                let p = frame.to_local_2d(&self.store.vertex(v)?.point);
                if points.last().is_none_or(|q| (p - q).norm() >= self.epsilon) {
                    points.push(p);
                }
            }
            while points.len() > 1
                && points
                    .first()
                    .zip(points.last())
                    .is_some_and(|(a, b)| (a - b).norm() < self.epsilon)
            {
                points.pop();
            }
            if points.len() < 3 {
                return Err(ExportError::DegenerateInput("profile loop of fewer than three points".into()));
            }
            return Ok(ProfileCurve::Polyline(points));
        }

        // Otherwise the loop must be one full circle split into arcs.
        let mut circle: Option<(Point3, f64)> = None;
        let mut sweep = 0.0;
        for oe in edges {
            let edge = self.store.edge(oe.edge)?;
            let EdgeCurve::Arc(arc) = &edge.curve else {
                return Err(ExportError::NotApplicable("profile mixes lines and curves"));
            };
            if arc.normal().dot(plane.plane_normal()).abs() < 1.0 - PARALLEL_TOLERANCE {
                return Err(ExportError::NotApplicable("profile arc leaves the cap plane"));
            }
            match circle {
                None => circle = Some((*arc.center(), arc.radius())),
                Some((center, radius)) => {
                    if (center - arc.center()).norm() >= self.epsilon || (radius - arc.radius()).abs() >= self.epsilon {
                        return Err(ExportError::NotApplicable("profile arcs do not share a circle"));
                    }
                }
            }
            sweep += (edge.t_end - edge.t_start).abs();
        }
        match circle {
            Some((center, radius)) if (sweep - TAU).abs() < 1e-6 => Ok(ProfileCurve::Circle {
                center: frame.to_local_2d(&center),
                radius,
            }),
            _ => Err(ExportError::NotApplicable("profile arcs do not close a circle")),
        }
    }
}

/// A polygonal outline of a profile curve, for containment tests.
fn outline(curve: &ProfileCurve) -> Vec<Point2> {
    match curve {
        ProfileCurve::Polyline(points) => points.clone(),
        ProfileCurve::Circle { center, radius } => (0..16)
            .map(|i| {
                let a = TAU * f64::from(i) / 16.0;
                Point2::new(center.x + radius * a.cos(), center.y + radius * a.sin())
            })
            .collect(),
    }
}

/// Outer polylines run counter-clockwise, holes clockwise.
fn oriented(curve: ProfileCurve, outer: bool) -> ProfileCurve {
    match curve {
        ProfileCurve::Polyline(mut points) => {
            if (signed_area_2d(&points) > 0.0) != outer {
                points.reverse();
            }
            ProfileCurve::Polyline(points)
        }
        circle @ ProfileCurve::Circle { .. } => circle,
    }
}
