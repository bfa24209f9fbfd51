//! Miter offset of closed polygons.
//!
//! Used to grow the convex hull of the correspondence sources into a ring of
//! fixed anchor points, so the warp fades back to identity at a distance from
//! the pairs.
//!
//! Each vertex is treated independently: the two edges meeting at it are
//! shifted outward along their normals by `distance` and the shifted lines
//! are intersected. For convex input every angle is below 180°, so the
//! outward offset is well defined. Where the adjacent edges are parallel or
//! anti-parallel the intersection does not exist, and the vertex is moved
//! along the normal of its incoming edge instead.

use super::hull::ring_signed_area;
use super::{Point2, Tolerance, Vec2};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OffsetError {
    #[error("offset distance must be finite and non-negative, got {0}")]
    InvalidDistance(f64),
    #[error("polygon requires at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("polygon has a zero-length edge at vertex {0}")]
    DegenerateEdge(usize),
    #[error("polygon vertices must be finite")]
    NonFinite,
}

/// Offsets the closed polygon `points` outward by `distance`.
///
/// `points` is an open ring (closing vertex not repeated) in either winding;
/// the output keeps the input winding and has one vertex per input vertex.
/// A zero distance returns the input unchanged.
///
/// # Errors
/// Returns an error for a negative or non-finite distance, fewer than three
/// vertices, non-finite coordinates or zero-length edges.
pub fn offset_polygon(
    points: &[Point2],
    distance: f64,
    tol: Tolerance,
) -> Result<Vec<Point2>, OffsetError> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(OffsetError::InvalidDistance(distance));
    }
    if points.len() < 3 {
        return Err(OffsetError::TooFewVertices(points.len()));
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(OffsetError::NonFinite);
    }
    if distance == 0.0 {
        return Ok(points.to_vec());
    }

    // Outward is to the right of each edge for CCW rings, to the left for CW.
    let outward_sign = if ring_signed_area(points) >= 0.0 { 1.0 } else { -1.0 };

    let n = points.len();
    let mut normals = Vec::with_capacity(n);
    for i in 0..n {
        let edge = points[(i + 1) % n] - points[i];
        let dir = edge
            .normalized()
            .filter(|_| !tol.is_zero_length(edge.length()))
            .ok_or(OffsetError::DegenerateEdge(i))?;
        normals.push(dir.perp_cw() * outward_sign);
    }

    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let prev = (i + n - 1) % n;
        result.push(miter_vertex(
            points[prev],
            points[i],
            points[(i + 1) % n],
            normals[prev],
            normals[i],
            distance,
            tol,
        ));
    }
    Ok(result)
}

/// Intersects the incoming edge `(prev, vertex)` and outgoing edge
/// `(vertex, next)`, each shifted by `distance` along its outward normal.
fn miter_vertex(
    prev: Point2,
    vertex: Point2,
    next: Point2,
    n_in: Vec2,
    n_out: Vec2,
    distance: f64,
    tol: Tolerance,
) -> Point2 {
    let d_in = vertex - prev;
    let d_out = next - vertex;

    let a = prev + n_in * distance;
    let b = vertex + n_out * distance;

    let denom = d_in.cross(d_out);
    let scale = d_in.length() * d_out.length();
    if denom.abs() <= tol.relative_to(scale) {
        // Parallel or anti-parallel edges: no miter point exists.
        return vertex + n_in * distance;
    }

    // Solve a + t * d_in = b + s * d_out for t.
    let t = (b - a).cross(d_out) / denom;
    a + d_in * t
}
