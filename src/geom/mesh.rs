//! Delaunay triangle mesh over planar points with point location.
//!
//! The triangulation itself is delegated to `delaunator`; this module keeps
//! the triangles as index triples into the caller's point list so a second,
//! index-aligned point list (the warp targets) can be addressed with the same
//! triangle.

use super::bvh::{Bounds2, Bvh};
use super::{Point2, Tolerance, orient2d};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("triangulation requires at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("mesh points must be finite")]
    NonFinite,
    #[error("points are collinear or coincident; no triangles could be formed")]
    NoTriangles,
}

/// Triangulated point set with triangle lookup.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    vertices: Vec<Point2>,
    triangles: Vec<[usize; 3]>,
    bounds: Vec<Bounds2>,
    index: Bvh,
}

impl TriangleMesh {
    /// Builds the Delaunay triangulation of `points`.
    ///
    /// Coincident points are triangulated once; the later duplicates are not
    /// referenced by any triangle (see [`TriangleMesh::unused_vertices`]).
    ///
    /// # Errors
    /// Fails for fewer than three points, non-finite coordinates, or when all
    /// points are collinear.
    pub fn delaunay(points: &[Point2]) -> Result<Self, MeshError> {
        if points.len() < 3 {
            return Err(MeshError::TooFewPoints(points.len()));
        }
        if points.iter().any(|p| !p.is_finite()) {
            return Err(MeshError::NonFinite);
        }

        let delaunator_points: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&delaunator_points);

        let mut triangles = Vec::with_capacity(triangulation.triangles.len() / 3);
        let mut bounds = Vec::with_capacity(triangulation.triangles.len() / 3);
        for tri in triangulation.triangles.chunks_exact(3) {
            let corners = [points[tri[0]], points[tri[1]], points[tri[2]]];
            if orient2d(corners[0], corners[1], corners[2]) == 0.0 {
                continue;
            }
            triangles.push([tri[0], tri[1], tri[2]]);
            bounds.push(Bounds2::of_triangle(corners));
        }

        let index = Bvh::build(&bounds).ok_or(MeshError::NoTriangles)?;

        log::debug!(
            "delaunay mesh: {} points, {} triangles, {} hull vertices",
            points.len(),
            triangles.len(),
            triangulation.hull.len()
        );

        Ok(Self {
            vertices: points.to_vec(),
            triangles,
            bounds,
            index,
        })
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    /// Triangles as index triples into [`TriangleMesh::vertices`].
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Resolved corner coordinates of triangle `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn triangle_points(&self, index: usize) -> [Point2; 3] {
        let [a, b, c] = self.triangles[index];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    /// Indices of input points that no triangle references.
    #[must_use]
    pub fn unused_vertices(&self) -> Vec<usize> {
        let mut used = vec![false; self.vertices.len()];
        for tri in &self.triangles {
            for &i in tri {
                used[i] = true;
            }
        }
        used.iter()
            .enumerate()
            .filter_map(|(i, u)| (!u).then_some(i))
            .collect()
    }

    /// Finds a triangle containing `p`, boundaries included.
    ///
    /// Points on an edge shared by two triangles resolve to the lowest
    /// triangle index; both give the same interpolated value.
    #[must_use]
    pub fn locate(&self, p: Point2, tol: Tolerance) -> Option<usize> {
        if !p.is_finite() {
            return None;
        }
        // Per-triangle slack never exceeds the slack over the whole mesh.
        let reach = self
            .index
            .root_bounds()
            .map_or(tol.eps, |root| tol.relative_to(root.span()));
        let mut found: Option<usize> = None;
        self.index.query(Bounds2::around(p, reach), |candidate| {
            if found.is_none_or(|best| candidate < best) && self.contains(candidate, p, tol) {
                found = Some(candidate);
            }
            true
        });
        found
    }

    fn contains(&self, index: usize, p: Point2, tol: Tolerance) -> bool {
        let bounds = self.bounds[index];
        bounds.contains(p, tol.relative_to(bounds.span()))
            && barycentric(p, self.triangle_points(index))
                .is_some_and(|l| l.iter().all(|&li| li >= -tol.eps))
    }
}

/// Barycentric coordinates `(l1, l2, l3)` of `p` in the triangle `[a1, a2, a3]`.
///
/// Returns `None` for a degenerate (zero area) triangle.
#[must_use]
pub fn barycentric(p: Point2, [a1, a2, a3]: [Point2; 3]) -> Option<[f64; 3]> {
    let d = (a2.y - a3.y) * (a1.x - a3.x) + (a3.x - a2.x) * (a1.y - a3.y);
    if d == 0.0 || !d.is_finite() {
        return None;
    }
    let l1 = ((a2.y - a3.y) * (p.x - a3.x) + (a3.x - a2.x) * (p.y - a3.y)) / d;
    let l2 = ((a3.y - a1.y) * (p.x - a3.x) + (a1.x - a3.x) * (p.y - a3.y)) / d;
    Some([l1, l2, 1.0 - l1 - l2])
}

/// Cartesian point for barycentric coordinates `l` in the triangle `[b1, b2, b3]`.
#[must_use]
pub fn from_barycentric([l1, l2, l3]: [f64; 3], [b1, b2, b3]: [Point2; 3]) -> Point2 {
    Point2::new(
        l1 * b1.x + l2 * b2.x + l3 * b3.x,
        l1 * b1.y + l2 * b2.y + l3 * b3.y,
    )
}
