use crate::geom::{Point2, Tolerance, Vec2};
use crate::pairs::CorrespondenceSet;

use super::{TransformError, TransformKind, TransformResult, Transformer, expect_pair_count};

/// Similarity transform anchored on two pairs `a1 → b1`, `a2 → b2`.
///
/// Points are moved so `a1` sits at the origin, scaled by `|b2 - b1| / |a2 - a1|`,
/// rotated by the angle between the two base vectors and moved onto `b1`.
/// The map is exact at both anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransformer {
    origin: Point2,
    destination: Point2,
    scale: f64,
    rotation: f64,
    sin: f64,
    cos: f64,
}

impl LinearTransformer {
    /// # Errors
    /// Fails unless `pairs` holds exactly two pairs, and with
    /// [`TransformError::DegenerateInput`] when both sources coincide.
    pub fn new(pairs: &CorrespondenceSet, tol: Tolerance) -> TransformResult<Self> {
        expect_pair_count(pairs, TransformKind::Linear, 2)?;
        let [first, second] = [pairs.pairs()[0], pairs.pairs()[1]];

        let base_a: Vec2 = second.source - first.source;
        let base_b: Vec2 = second.target - first.target;

        let len_a = base_a.length();
        if tol.is_zero_length(len_a) || !len_a.is_finite() {
            return Err(TransformError::degenerate(
                "the two source points coincide; scale is undefined",
            ));
        }

        let scale = base_b.length() / len_a;
        let rotation = base_b.angle() - base_a.angle();
        let (sin, cos) = rotation.sin_cos();

        Ok(Self {
            origin: first.source,
            destination: first.target,
            scale,
            rotation,
            sin,
            cos,
        })
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Rotation in radians.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}

impl Transformer for LinearTransformer {
    fn map(&self, point: Point2) -> Point2 {
        let v = (point - self.origin) * self.scale;
        let rotated = Vec2::new(
            self.cos * v.x - self.sin * v.y,
            self.sin * v.x + self.cos * v.y,
        );
        self.destination + rotated
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Linear
    }
}
