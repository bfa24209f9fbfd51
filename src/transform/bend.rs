//! Piecewise affine warp over a Delaunay mesh of the pair sources.
//!
//! Each source triangle is mapped affinely onto the triangle formed by the
//! targets of the same pairs. Adjacent triangles share their edge endpoints,
//! so the warp is continuous. Outside the mesh points are left untouched.
//!
//! With a buffer, the hull of the sources is grown by the buffer distance and
//! its vertices are added to the mesh as fixed points (source == target). The
//! deformation then fades out over the buffer band instead of stopping
//! abruptly at the hull.

use crate::geom::{
    Point2, Tolerance, TriangleMesh, barycentric, convex_hull, from_barycentric, offset_polygon,
};
use crate::pairs::CorrespondenceSet;

use super::{
    BendPreview, TransformError, TransformKind, TransformResult, Transformer, expect_min_pairs,
};

pub const MIN_BEND_PAIRS: usize = 4;

#[derive(Debug, Clone)]
pub struct BendTransformer {
    hull: Vec<Point2>,
    expanded_hull: Option<Vec<Point2>>,
    mesh: TriangleMesh,
    targets: Vec<Point2>,
    tol: Tolerance,
}

impl BendTransformer {
    /// Builds the mesh for `pairs`, grown by `buffer` when it is positive.
    ///
    /// # Errors
    /// Fails for fewer than four pairs, an invalid buffer, or sources whose
    /// hull has no area.
    pub fn new(pairs: &CorrespondenceSet, buffer: f64, tol: Tolerance) -> TransformResult<Self> {
        expect_min_pairs(pairs, TransformKind::Bend, MIN_BEND_PAIRS)?;
        if !buffer.is_finite() || buffer < 0.0 {
            return Err(TransformError::InvalidBuffer(buffer));
        }

        let mut sources = pairs.sources();
        let mut targets = pairs.targets();

        let hull = convex_hull(&sources, tol);
        if hull.len() < 3 {
            return Err(TransformError::degenerate(
                "the source points are collinear; their hull has no area",
            ));
        }

        let expanded_hull = if buffer > 0.0 {
            let ring = offset_polygon(&hull, buffer, tol)?;
            sources.extend(ring.iter().copied());
            targets.extend(ring.iter().copied());
            Some(ring)
        } else {
            None
        };

        let mesh = TriangleMesh::delaunay(&sources)?;
        for index in mesh.unused_vertices() {
            if index < pairs.len() {
                log::warn!(
                    "pair {index} repeats an earlier source point at ({}, {}); it is ignored",
                    sources[index].x,
                    sources[index].y
                );
            }
        }

        log::debug!(
            "bend mesh: {} pairs, {} anchors, {} triangles",
            pairs.len(),
            sources.len() - pairs.len(),
            mesh.triangle_count()
        );

        Ok(Self {
            hull,
            expanded_hull,
            mesh,
            targets,
            tol,
        })
    }

    #[must_use]
    pub fn hull(&self) -> &[Point2] {
        &self.hull
    }

    #[must_use]
    pub fn expanded_hull(&self) -> Option<&[Point2]> {
        self.expanded_hull.as_deref()
    }

    #[must_use]
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    #[must_use]
    pub fn preview(&self) -> BendPreview {
        BendPreview {
            hull: self.hull.clone(),
            expanded_hull: self.expanded_hull.clone(),
            triangles: (0..self.mesh.triangle_count())
                .map(|i| self.mesh.triangle_points(i))
                .collect(),
        }
    }

    fn target_triangle(&self, index: usize) -> [Point2; 3] {
        let [a, b, c] = self.mesh.triangles()[index];
        [self.targets[a], self.targets[b], self.targets[c]]
    }
}

impl Transformer for BendTransformer {
    fn map(&self, point: Point2) -> Point2 {
        let Some(index) = self.mesh.locate(point, self.tol) else {
            return point;
        };
        match barycentric(point, self.mesh.triangle_points(index)) {
            Some(weights) => from_barycentric(weights, self.target_triangle(index)),
            None => point,
        }
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Bend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{MeshError, convex_ring_contains};
    use crate::pairs::CorrespondencePair;

    fn set(pairs: &[((f64, f64), (f64, f64))]) -> CorrespondenceSet {
        pairs
            .iter()
            .map(|&(a, b)| CorrespondencePair::new(a.into(), b.into()))
            .collect()
    }

    fn assert_close(actual: Point2, expected: Point2) {
        assert!(
            Tolerance::LOOSE.approx_eq_point2(actual, expected),
            "expected {expected:?}, got {actual:?}"
        );
    }

    fn warped_square() -> CorrespondenceSet {
        set(&[
            ((0.0, 0.0), (0.5, -0.5)),
            ((10.0, 0.0), (10.5, 0.5)),
            ((10.0, 10.0), (9.5, 10.5)),
            ((0.0, 10.0), (-0.5, 9.5)),
            ((5.0, 5.0), (6.0, 4.0)),
        ])
    }

    #[test]
    fn mesh_vertices_map_exactly() {
        let pairs = warped_square();
        let bend = BendTransformer::new(&pairs, 0.0, Tolerance::default_geom()).unwrap();
        for pair in pairs.pairs() {
            assert_close(bend.map(pair.source), pair.target);
        }
        assert!(bend.expanded_hull().is_none());
        assert_eq!(bend.hull().len(), 4);
    }

    #[test]
    fn points_outside_the_hull_are_unchanged() {
        let bend = BendTransformer::new(&warped_square(), 0.0, Tolerance::default_geom()).unwrap();
        let outside = Point2::new(-3.0, 4.0);
        assert_eq!(bend.map(outside), outside);
    }

    #[test]
    fn buffer_adds_fixed_anchor_ring() {
        let pairs = warped_square();
        let bend = BendTransformer::new(&pairs, 2.0, Tolerance::default_geom()).unwrap();
        let ring = bend.expanded_hull().unwrap().to_vec();

        assert_eq!(ring.len(), 4);
        assert_close(ring[0], Point2::new(-2.0, -2.0));
        for corner in &ring {
            assert_close(bend.map(*corner), *corner);
        }
        for pair in pairs.pairs() {
            assert_close(bend.map(pair.source), pair.target);
        }

        // Inside the buffer band the warp is active, beyond it identity.
        let in_band = Point2::new(-1.0, 5.0);
        assert!(convex_ring_contains(&ring, in_band, Tolerance::default_geom()));
        assert_ne!(bend.map(in_band), in_band);
        let beyond = Point2::new(-2.5, 5.0);
        assert_eq!(bend.map(beyond), beyond);
    }

    #[test]
    fn continuous_across_shared_edges() {
        let bend = BendTransformer::new(&warped_square(), 0.0, Tolerance::default_geom()).unwrap();
        // The diagonal from (0,0) to (5,5) is an edge shared by two triangles.
        let on_edge = Point2::new(2.5, 2.5);
        let eps = 1e-7;
        let left = bend.map(Point2::new(2.5 - eps, 2.5 + eps));
        let right = bend.map(Point2::new(2.5 + eps, 2.5 - eps));
        let center = bend.map(on_edge);
        assert!(left.distance_to(center) < 1e-5);
        assert!(right.distance_to(center) < 1e-5);
    }

    #[test]
    fn rejects_collinear_sources() {
        let pairs = set(&[
            ((0.0, 0.0), (0.0, 1.0)),
            ((1.0, 0.0), (1.0, 1.0)),
            ((2.0, 0.0), (2.0, 1.0)),
            ((3.0, 0.0), (3.0, 1.0)),
        ]);
        assert!(matches!(
            BendTransformer::new(&pairs, 0.0, Tolerance::default_geom()),
            Err(TransformError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn empty_mesh_is_degenerate_input() {
        assert!(matches!(
            TransformError::from(MeshError::NoTriangles),
            TransformError::DegenerateInput { .. }
        ));
        assert!(matches!(
            TransformError::from(MeshError::NonFinite),
            TransformError::Mesh(MeshError::NonFinite)
        ));
    }

    #[test]
    fn rejects_negative_buffer() {
        assert!(matches!(
            BendTransformer::new(&warped_square(), -1.0, Tolerance::default_geom()),
            Err(TransformError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn preview_exposes_mesh_triangles() {
        let bend = BendTransformer::new(&warped_square(), 1.0, Tolerance::default_geom()).unwrap();
        let preview = bend.preview();
        assert_eq!(preview.hull.len(), 4);
        assert_eq!(preview.expanded_hull.as_ref().map(Vec::len), Some(4));
        assert_eq!(preview.triangles.len(), bend.mesh().triangle_count());
        assert!(!preview.triangles.is_empty());
    }
}
