pub mod curve;
pub mod surface;

pub use curve::{Circle, Curve, CurveDomain, Helix, Line, NurbsCurve};
pub use surface::{Cone, Cylinder, NurbsSurface, Plane, Revolution, Ruled, Surface, SurfaceDomain};
