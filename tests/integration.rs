use vector_bender::bender::{Bender, Feature, RunOptions, determine_kind};
use vector_bender::geom::{FeatureGeometry, Geometry, Point2, Tolerance, convex_ring_contains};
use vector_bender::pairs::PairLine;
use vector_bender::transform::{
    Capabilities, TransformError, TransformKind, Transformer, TriangulationSupport,
};

fn pair(source: (f64, f64), target: (f64, f64)) -> PairLine {
    PairLine::new(source.into(), target.into())
}

fn assert_close(actual: Point2, expected: Point2) {
    assert!(
        Tolerance::LOOSE.approx_eq_point2(actual, expected),
        "expected {expected:?}, got {actual:?}"
    );
}

fn rotate_about(p: Point2, center: Point2, angle: f64) -> Point2 {
    let (sin, cos) = angle.sin_cos();
    let v = p - center;
    Point2::new(
        center.x + cos * v.x - sin * v.y,
        center.y + sin * v.x + cos * v.y,
    )
}

fn square_rotated_by(angle: f64) -> Vec<PairLine> {
    let center = Point2::new(5.0, 5.0);
    [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
        .into_iter()
        .map(|corner| {
            let target = rotate_about(corner.into(), center, angle);
            PairLine::new(corner.into(), target)
        })
        .collect()
}

#[test]
fn single_pair_translates() {
    let bender = Bender::new(
        &[pair((0.0, 0.0), (10.0, 10.0))],
        RunOptions::new(),
        &Capabilities::probe(),
    )
    .expect("translation");

    assert_eq!(bender.kind(), TransformKind::Translation);
    assert_eq!(bender.transformer().map(Point2::new(5.0, 5.0)), Point2::new(15.0, 15.0));
}

#[test]
fn two_pairs_rotate_a_quarter_turn() {
    let bender = Bender::new(
        &[pair((0.0, 0.0), (0.0, 0.0)), pair((10.0, 0.0), (0.0, 10.0))],
        RunOptions::new(),
        &Capabilities::probe(),
    )
    .expect("linear");

    assert_eq!(bender.kind(), TransformKind::Linear);
    assert_close(bender.transformer().map(Point2::new(10.0, 0.0)), Point2::new(0.0, 10.0));
    assert_close(bender.transformer().map(Point2::new(5.0, 0.0)), Point2::new(0.0, 5.0));
}

#[test]
fn collinear_affine_sources_fail_before_bending() {
    let lines = [
        pair((0.0, 0.0), (1.0, 0.0)),
        pair((1.0, 1.0), (2.0, 3.0)),
        pair((2.0, 2.0), (0.0, 4.0)),
    ];
    let err = Bender::new(&lines, RunOptions::new(), &Capabilities::probe()).unwrap_err();
    assert!(matches!(err, TransformError::DegenerateInput { .. }), "{err}");
}

#[cfg(feature = "triangulation")]
#[test]
fn rotated_square_keeps_its_centroid() {
    let angle = 5.0_f64.to_radians();
    let bender = Bender::new(&square_rotated_by(angle), RunOptions::new(), &Capabilities::probe())
        .expect("bend");
    assert_eq!(bender.kind(), TransformKind::Bend);

    let centroid = Point2::new(5.0, 5.0);
    assert_close(bender.transformer().map(centroid), centroid);

    // A rotation is affine, so every mesh triangle reproduces it exactly.
    for p in [Point2::new(2.0, 1.0), Point2::new(9.0, 7.5), Point2::new(0.0, 4.0)] {
        assert_close(bender.transformer().map(p), rotate_about(p, centroid, angle));
    }
}

#[cfg(feature = "triangulation")]
#[test]
fn bend_leaves_points_past_the_buffer_alone() {
    let options = RunOptions::new().buffer(3.0);
    let bender =
        Bender::new(&square_rotated_by(0.3), options, &Capabilities::probe()).expect("bend");
    let preview = bender.preview();
    let ring = preview.expanded_hull.clone().expect("buffered ring");

    assert_eq!(preview.hull.len(), 4);
    assert!(!preview.triangles.is_empty());

    let outside = Point2::new(-4.0, 5.0);
    assert!(!convex_ring_contains(&ring, outside, Tolerance::default_geom()));
    assert_eq!(bender.transformer().map(outside), outside);

    for corner in &ring {
        assert_close(bender.transformer().map(*corner), *corner);
    }
}

#[test]
fn missing_triangulation_is_a_distinct_state() {
    let missing = Capabilities {
        triangulation: TriangulationSupport::Missing,
    };
    let lines = square_rotated_by(0.1);

    let kind = determine_kind(&lines, &RunOptions::new(), &missing).unwrap();
    assert_eq!(kind, TransformKind::Unavailable);

    let err = Bender::new(&lines, RunOptions::new(), &missing).unwrap_err();
    assert!(matches!(err, TransformError::CapabilityUnavailable { .. }));
}

#[test]
fn features_round_trip_through_json() {
    let features_json = r#"[
        {"id": 1, "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [2, 0], [2, 2], [0, 0]]]}},
        {"id": "curve", "geometry": {"geometries": [], "type": "GeometryCollection"}},
        {"geometry": {"type": "Point", "coordinates": [1, 1]}, "selected": true}
    ]"#;
    let pairs_json = r#"[{"vertices": [[0, 0], [4, 4], [1, -1]]}]"#;

    let features: Vec<Feature> = serde_json::from_str(features_json).unwrap();
    let pair_lines: Vec<PairLine> = serde_json::from_str(pairs_json).unwrap();
    let bender = Bender::new(&pair_lines, RunOptions::new(), &Capabilities::probe()).unwrap();

    let bent = bender.bend_features(&features, None);
    assert_eq!(bent.len(), 3);
    assert_eq!(bent[0].id, Some(serde_json::json!(1)));
    assert_eq!(
        bent[0].geometry,
        FeatureGeometry::Known(Geometry::Polygon(vec![vec![
            Point2::new(1.0, -1.0).into(),
            Point2::new(3.0, -1.0).into(),
            Point2::new(3.0, 1.0).into(),
            Point2::new(1.0, -1.0).into(),
        ]]))
    );
    assert_eq!(bent[1], features[1]);
    assert_eq!(bent[2].geometry, Geometry::Point(Point2::new(2.0, 0.0).into()).into());

    let out = serde_json::to_value(&bent).unwrap();
    assert_eq!(out[1]["geometry"]["type"], "GeometryCollection");
    assert_eq!(out[2]["geometry"]["coordinates"], serde_json::json!([2.0, 0.0]));
}

#[test]
fn restricted_run_uses_selected_pairs_and_features() {
    let lines = vec![
        pair((0.0, 0.0), (5.0, 0.0)).selected(true),
        pair((9.0, 9.0), (9.0, 9.0)),
    ];
    let options = RunOptions::new()
        .restrict_pairs_to_selection(true)
        .restrict_features_to_selection(true)
        .pairs_to_pins(true);
    let bender = Bender::new(&lines, options, &Capabilities::probe()).unwrap();
    assert_eq!(bender.kind(), TransformKind::Translation);

    let features = vec![
        Feature::new(Geometry::Point(Point2::ORIGIN.into())).selected(true),
        Feature::new(Geometry::Point(Point2::ORIGIN.into())),
    ];
    let bent = bender.bend_features(&features, None);
    assert_eq!(bent[0].geometry, Geometry::Point(Point2::new(5.0, 0.0).into()).into());
    assert_eq!(bent[1].geometry, Geometry::Point(Point2::ORIGIN.into()).into());

    let pins = bender.pins(&lines);
    assert_eq!(pins[0].vertices, vec![Point2::new(5.0, 0.0), Point2::new(5.0, 0.0)]);
    assert_eq!(pins[1], lines[1]);
}

#[test]
fn malformed_pair_line_is_reported_with_its_index() {
    let lines = vec![
        pair((0.0, 0.0), (1.0, 1.0)),
        PairLine {
            vertices: vec![Point2::ORIGIN],
            selected: false,
        },
    ];
    let err = Bender::new(&lines, RunOptions::new(), &Capabilities::probe()).unwrap_err();
    assert!(matches!(
        err,
        TransformError::MalformedPair {
            index: 1,
            vertex_count: 1
        }
    ));
}

#[test]
fn feature_members_survive_a_run() {
    let features_json = r#"[
        {"type": "Feature", "id": 7, "selected": true,
         "properties": {"name": "well", "depth": 12.5},
         "geometry": {"type": "Point", "coordinates": [1.0, 1.0, 40.0]}},
        {"type": "Feature", "properties": {"name": "fence"}, "bbox": [0.0, 0.0, 1.0, 1.0],
         "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}}
    ]"#;
    let input: serde_json::Value = serde_json::from_str(features_json).unwrap();
    let features: Vec<Feature> = serde_json::from_value(input.clone()).unwrap();
    let options = RunOptions::new().restrict_features_to_selection(true);
    let bender = Bender::new(&[pair((0.0, 0.0), (2.0, 3.0))], options, &Capabilities::probe())
        .expect("translation");

    let out = serde_json::to_value(bender.bend_features(&features, None)).unwrap();
    assert_eq!(out[0]["type"], "Feature");
    assert_eq!(out[0]["id"], 7);
    assert_eq!(out[0]["selected"], true);
    assert_eq!(out[0]["properties"], input[0]["properties"]);
    assert_eq!(out[0]["geometry"]["coordinates"], serde_json::json!([3.0, 4.0, 40.0]));
    assert_eq!(out[1], input[1]);
}
