#[cfg(feature = "triangulation")]
mod bvh;
mod core;
mod hull;
#[cfg(feature = "triangulation")]
mod mesh;
mod offset;
mod walker;

pub use core::{Point2, Tolerance, Vec2, orient2d};
pub use hull::{convex_hull, convex_ring_contains, ring_signed_area};
#[cfg(feature = "triangulation")]
pub use mesh::{MeshError, TriangleMesh, barycentric, from_barycentric};
pub use offset::{OffsetError, offset_polygon};
pub use walker::{FeatureGeometry, Geometry, LineString, PolygonRings, Position};

#[cfg(test)]
mod tests;
