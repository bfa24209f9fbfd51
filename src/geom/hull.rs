//! Planar convex hull (Andrew's monotone chain).

use std::cmp::Ordering;

use super::{Point2, Tolerance, orient2d};

/// Computes the convex hull of `points`.
///
/// The result is an open, counter-clockwise ring: the first vertex is not
/// repeated at the end and collinear boundary points are dropped. Coincident
/// input points collapse to one.
///
/// Degenerate inputs produce short rings: a single vertex for coincident
/// points and two vertices when every point lies on one line. Callers that
/// need an area must check for at least three vertices.
#[must_use]
pub fn convex_hull(points: &[Point2], tol: Tolerance) -> Vec<Point2> {
    let mut pts: Vec<Point2> = points.iter().copied().filter(|p| p.is_finite()).collect();
    pts.sort_by(|a, b| match a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal),
        o => o,
    });
    pts.dedup_by(|a, b| tol.approx_eq_point2(*a, *b));

    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point2> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && orient2d(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Point2> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && orient2d(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    let mut hull = lower;
    hull.extend(upper);
    hull
}

/// Signed area of an open ring; positive for counter-clockwise winding.
#[must_use]
pub fn ring_signed_area(ring: &[Point2]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        twice_area += a.x * b.y - b.x * a.y;
    }
    0.5 * twice_area
}

/// Whether `p` lies inside or on the boundary of the convex, counter-clockwise
/// ring `hull`.
#[must_use]
pub fn convex_ring_contains(hull: &[Point2], p: Point2, tol: Tolerance) -> bool {
    if hull.len() < 3 {
        return false;
    }
    hull.iter().enumerate().all(|(i, a)| {
        let b = hull[(i + 1) % hull.len()];
        let edge_len = a.distance_to(b);
        orient2d(*a, b, p) >= -tol.relative_to(edge_len)
    })
}
