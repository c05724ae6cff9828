mod tessellate_edge;
mod tessellate_face;
mod tessellate_solid;
mod tessellator;

pub use tessellate_edge::{edge_segments, sample_edge_use};
pub(crate) use tessellate_face::project_uv;
pub use tessellate_face::TessellateFace;
pub use tessellate_solid::TessellateSolid;
pub use tessellator::{split_components, TessellationPass, Tessellator, TessellatorOutput};

use std::f64::consts::PI;

use crate::math::Point3;

/// Parameters controlling tessellation quality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationParams {
    /// Maximum allowed chord deviation from the true geometry.
    pub tolerance: f64,
    /// Maximum angle in radians swept by one segment of a circular curve.
    pub max_angle: f64,
    /// Minimum number of segments for curved edges.
    pub min_segments: usize,
    /// Maximum number of segments for curved edges.
    pub max_segments: usize,
}

impl TessellationParams {
    /// Few, large facets.
    #[must_use]
    pub fn coarse() -> Self {
        Self {
            tolerance: 0.1,
            max_angle: PI / 4.0,
            min_segments: 4,
            max_segments: 64,
        }
    }

    /// The default precision.
    #[must_use]
    pub fn normal() -> Self {
        Self {
            tolerance: 0.01,
            max_angle: PI / 8.0,
            min_segments: 4,
            max_segments: 256,
        }
    }

    /// Many, small facets.
    #[must_use]
    pub fn fine() -> Self {
        Self {
            tolerance: 0.001,
            max_angle: PI / 16.0,
            min_segments: 8,
            max_segments: 1024,
        }
    }

    /// Sets the chord tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum segment angle.
    #[must_use]
    pub fn with_max_angle(mut self, max_angle: f64) -> Self {
        self.max_angle = max_angle;
        self
    }

    /// Number of segments for an arc of `radius` sweeping `sweep` radians.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn angular_segments(&self, radius: f64, sweep: f64) -> usize {
        let sweep = sweep.abs();
        let by_chord = if radius > self.tolerance {
            let half_angle = (1.0 - self.tolerance / radius).acos();
            (sweep / (2.0 * half_angle)).ceil() as usize
        } else {
            self.min_segments
        };
        let by_angle = if self.max_angle > 0.0 {
            (sweep / self.max_angle).ceil() as usize
        } else {
            0
        };
        by_chord.max(by_angle).clamp(self.min_segments, self.max_segments)
    }
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self::normal()
    }
}

/// Requested level of detail for tessellated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LevelOfDetail {
    Coarse,
    #[default]
    Normal,
    Fine,
}

impl LevelOfDetail {
    /// The tessellation preset for this level.
    #[must_use]
    pub fn params(self) -> TessellationParams {
        match self {
            Self::Coarse => TessellationParams::coarse(),
            Self::Normal => TessellationParams::normal(),
            Self::Fine => TessellationParams::fine(),
        }
    }
}

/// A triangle mesh approximation of one or more faces.
///
/// Triangles are wound counter-clockwise seen from outside the body.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Appends another mesh, offsetting its indices.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]));
    }
}
