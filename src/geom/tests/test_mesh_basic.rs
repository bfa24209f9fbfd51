use crate::geom::bvh::Bounds2;
use crate::geom::{MeshError, Point2, Tolerance, TriangleMesh, barycentric, from_barycentric};

fn pts(coords: &[(f64, f64)]) -> Vec<Point2> {
    coords.iter().map(|&c| c.into()).collect()
}

/// Deterministic point stream; the crate carries no `rand`.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn point_in(&mut self, lo: f64, hi: f64) -> Point2 {
        let x = lo + (hi - lo) * self.next_unit();
        let y = lo + (hi - lo) * self.next_unit();
        Point2::new(x, y)
    }
}

fn locate_by_scan(mesh: &TriangleMesh, p: Point2, tol: Tolerance) -> Option<usize> {
    (0..mesh.triangle_count()).find(|&i| {
        let corners = mesh.triangle_points(i);
        let bounds = Bounds2::of_triangle(corners);
        bounds.contains(p, tol.relative_to(bounds.span()))
            && barycentric(p, corners).is_some_and(|l| l.iter().all(|&li| li >= -tol.eps))
    })
}

fn square_with_center() -> TriangleMesh {
    TriangleMesh::delaunay(&pts(&[
        (0.0, 0.0),
        (4.0, 0.0),
        (4.0, 4.0),
        (0.0, 4.0),
        (2.0, 2.0),
    ]))
    .unwrap()
}

#[test]
fn delaunay_covers_the_hull() {
    let mesh = square_with_center();
    assert_eq!(mesh.triangle_count(), 4);
    assert!(mesh.unused_vertices().is_empty());

    let area: f64 = (0..mesh.triangle_count())
        .map(|i| {
            let [a, b, c] = mesh.triangle_points(i);
            0.5 * ((b - a).cross(c - a)).abs()
        })
        .sum();
    assert!((area - 16.0).abs() < 1e-9);
}

#[test]
fn locate_finds_interior_and_boundary_points() {
    let mesh = square_with_center();
    let tol = Tolerance::default_geom();

    for p in [
        Point2::new(1.0, 0.5),
        Point2::new(3.5, 2.0),
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(2.0, 2.0),
    ] {
        let index = mesh.locate(p, tol).unwrap_or_else(|| panic!("{p:?} not located"));
        let weights = barycentric(p, mesh.triangle_points(index)).unwrap();
        assert!(weights.iter().all(|&w| w >= -1e-9), "{weights:?}");
    }

    assert!(mesh.locate(Point2::new(-0.1, 2.0), tol).is_none());
    assert!(mesh.locate(Point2::new(f64::NAN, 2.0), tol).is_none());
}

#[test]
fn locate_matches_a_linear_scan() {
    let mut rng = Lcg(0x5eed);
    let points: Vec<Point2> = (0..300).map(|_| rng.point_in(0.0, 100.0)).collect();
    let mesh = TriangleMesh::delaunay(&points).unwrap();
    let tol = Tolerance::default_geom();

    let mut queries: Vec<Point2> = (0..1000).map(|_| rng.point_in(-10.0, 110.0)).collect();
    queries.extend_from_slice(&points);
    for &[a, b, _] in mesh.triangles() {
        let (a, b) = (points[a], points[b]);
        queries.push(Point2::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y)));
    }

    let mut inside = 0;
    for p in queries {
        let expected = locate_by_scan(&mesh, p, tol);
        assert_eq!(mesh.locate(p, tol), expected, "{p:?}");
        inside += usize::from(expected.is_some());
    }
    assert!(inside > 1000, "too few located points: {inside}");
}

#[test]
fn duplicate_points_are_left_out_of_triangles() {
    let mesh = TriangleMesh::delaunay(&pts(&[
        (0.0, 0.0),
        (1.0, 0.0),
        (0.0, 1.0),
        (1.0, 0.0),
    ]))
    .unwrap();
    assert_eq!(mesh.triangle_count(), 1);
    assert_eq!(mesh.unused_vertices().len(), 1);
    assert_eq!(mesh.vertices().len(), 4);
}

#[test]
fn degenerate_inputs_fail() {
    assert_eq!(
        TriangleMesh::delaunay(&pts(&[(0.0, 0.0), (1.0, 1.0)])).unwrap_err(),
        MeshError::TooFewPoints(2)
    );
    assert_eq!(
        TriangleMesh::delaunay(&pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)])).unwrap_err(),
        MeshError::NoTriangles
    );
    assert_eq!(
        TriangleMesh::delaunay(&pts(&[(0.0, 0.0), (1.0, 0.0), (f64::INFINITY, 1.0)]))
            .unwrap_err(),
        MeshError::NonFinite
    );
}

#[test]
fn barycentric_round_trips_through_the_same_triangle() {
    let tri = [Point2::new(0.0, 0.0), Point2::new(3.0, 0.0), Point2::new(0.0, 2.0)];

    assert_eq!(barycentric(tri[0], tri), Some([1.0, 0.0, 0.0]));
    let p = Point2::new(1.0, 0.5);
    let weights = barycentric(p, tri).unwrap();
    assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert!(Tolerance::LOOSE.approx_eq_point2(from_barycentric(weights, tri), p));

    let flat = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
    assert!(barycentric(p, flat).is_none());
}
