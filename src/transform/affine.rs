use crate::geom::{Point2, Tolerance};
use crate::pairs::CorrespondenceSet;

use super::{TransformError, TransformKind, TransformResult, Transformer, expect_pair_count};

/// The affine map through three pairs.
///
/// ```text
///     | a  b  c |
/// M = | d  e  f |      x' = a*x + b*y + c
///     | 0  0  1 |      y' = d*x + e*y + f
/// ```
///
/// Solved in closed form with Cramer's rule. The shared denominator is twice
/// the signed area of the source triangle, so collinear sources have no
/// solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransformer {
    coeffs: [f64; 6],
}

impl AffineTransformer {
    /// # Errors
    /// Fails unless `pairs` holds exactly three pairs, and with
    /// [`TransformError::DegenerateInput`] when the sources are collinear.
    pub fn new(pairs: &CorrespondenceSet, tol: Tolerance) -> TransformResult<Self> {
        expect_pair_count(pairs, TransformKind::Affine, 3)?;
        let p = pairs.pairs();
        let (x11, y11, x12, y12) = (p[0].source.x, p[0].source.y, p[0].target.x, p[0].target.y);
        let (x21, y21, x22, y22) = (p[1].source.x, p[1].source.y, p[1].target.x, p[1].target.y);
        let (x31, y31, x32, y32) = (p[2].source.x, p[2].source.y, p[2].target.x, p[2].target.y);

        let den = x11 * (y31 - y21) - x21 * y31 + x31 * y21 + (x21 - x31) * y11;

        // Compare against the squared extent so the check is scale free.
        let span = [x21 - x11, y21 - y11, x31 - x11, y31 - y11]
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if !den.is_finite() || den.abs() <= tol.relative_to(span * span) || span == 0.0 {
            return Err(TransformError::degenerate(
                "the three source points are collinear; the affine system has no unique solution",
            ));
        }

        let a = (x12 * (y31 - y21) - x22 * y31 + x32 * y21 + (x22 - x32) * y11) / den;
        let b = (x11 * (x32 - x22) - x21 * x32 + x22 * x31 + x12 * (x21 - x31)) / den;
        let c = -(x11 * (x32 * y21 - x22 * y31)
            + x12 * (x21 * y31 - x31 * y21)
            + (x22 * x31 - x21 * x32) * y11)
            / den;
        let d = (y21 * y32 + y11 * (y22 - y32) + y12 * (y31 - y21) - y22 * y31) / den;
        let e = -(x21 * y32 + x11 * (y22 - y32) - x31 * y22 + (x31 - x21) * y12) / den;
        let f = (x11 * (y22 * y31 - y21 * y32)
            + y11 * (x21 * y32 - x31 * y22)
            + y12 * (x31 * y21 - x21 * y31))
            / den;

        Ok(Self {
            coeffs: [a, b, c, d, e, f],
        })
    }

    /// `[a, b, c, d, e, f]`.
    #[must_use]
    pub fn coefficients(&self) -> [f64; 6] {
        self.coeffs
    }
}

impl Transformer for AffineTransformer {
    fn map(&self, point: Point2) -> Point2 {
        let [a, b, c, d, e, f] = self.coeffs;
        Point2::new(
            a * point.x + b * point.y + c,
            d * point.x + e * point.y + f,
        )
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Affine
    }
}
