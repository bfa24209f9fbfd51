use crate::geom::{Point2, Vec2};
use crate::pairs::CorrespondenceSet;

use super::{TransformKind, TransformResult, Transformer, expect_pair_count};

/// Shifts every point by the offset of a single pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationTransformer {
    offset: Vec2,
}

impl TranslationTransformer {
    /// # Errors
    /// Fails unless `pairs` holds exactly one pair.
    pub fn new(pairs: &CorrespondenceSet) -> TransformResult<Self> {
        expect_pair_count(pairs, TransformKind::Translation, 1)?;
        let pair = pairs.pairs()[0];
        Ok(Self {
            offset: pair.target - pair.source,
        })
    }

    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

impl Transformer for TranslationTransformer {
    fn map(&self, point: Point2) -> Point2 {
        point + self.offset
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Translation
    }
}
