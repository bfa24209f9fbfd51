//! Correspondence pairs read from a layer of two-point lines.
//!
//! Every line of the pairs layer contributes one pair: its first vertex is
//! the source position, its last vertex the target position. Intermediate
//! vertices are ignored.

use serde::{Deserialize, Serialize};

use crate::geom::Point2;
use crate::transform::TransformError;

/// One line feature of the pairs layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairLine {
    pub vertices: Vec<Point2>,
    #[serde(default)]
    pub selected: bool,
}

impl PairLine {
    #[must_use]
    pub fn new(source: Point2, target: Point2) -> Self {
        Self {
            vertices: vec![source, target],
            selected: false,
        }
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrespondencePair {
    pub source: Point2,
    pub target: Point2,
}

impl CorrespondencePair {
    #[must_use]
    pub const fn new(source: Point2, target: Point2) -> Self {
        Self { source, target }
    }

    /// Pair from the first and last vertex of `vertices`.
    ///
    /// Returns `None` when fewer than two vertices are given.
    #[must_use]
    pub fn from_line(vertices: &[Point2]) -> Option<Self> {
        match vertices {
            [first, .., last] => Some(Self::new(*first, *last)),
            _ => None,
        }
    }
}

/// Ordered correspondence pairs for one run.
///
/// `sources()[i]` maps to `targets()[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrespondenceSet {
    pairs: Vec<CorrespondencePair>,
}

impl CorrespondenceSet {
    #[must_use]
    pub fn new(pairs: Vec<CorrespondencePair>) -> Self {
        Self { pairs }
    }

    /// Reads the pairs of `lines`, in order.
    ///
    /// With `restrict_to_selection` only selected lines are read.
    ///
    /// # Errors
    /// Returns [`TransformError::MalformedPair`] for a considered line with
    /// fewer than two vertices.
    pub fn from_lines(lines: &[PairLine], restrict_to_selection: bool) -> Result<Self, TransformError> {
        let pairs = considered_lines(lines, restrict_to_selection)
            .map(|(index, line)| {
                CorrespondencePair::from_line(&line.vertices).ok_or(TransformError::MalformedPair {
                    index,
                    vertex_count: line.vertices.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!(
            "read {} correspondence pairs from {} lines (restricted: {})",
            pairs.len(),
            lines.len(),
            restrict_to_selection
        );
        Ok(Self { pairs })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn pairs(&self) -> &[CorrespondencePair] {
        &self.pairs
    }

    #[must_use]
    pub fn sources(&self) -> Vec<Point2> {
        self.pairs.iter().map(|pair| pair.source).collect()
    }

    #[must_use]
    pub fn targets(&self) -> Vec<Point2> {
        self.pairs.iter().map(|pair| pair.target).collect()
    }
}

impl FromIterator<CorrespondencePair> for CorrespondenceSet {
    fn from_iter<I: IntoIterator<Item = CorrespondencePair>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Turns the considered pair lines into pins: each becomes the degenerate
/// line `[target, target]`, so it holds its target in place on a later run.
///
/// Lines outside the selection (when restricted) and lines with fewer than
/// two vertices are returned unchanged.
#[must_use]
pub fn pairs_to_pins(lines: &[PairLine], restrict_to_selection: bool) -> Vec<PairLine> {
    lines
        .iter()
        .map(|line| {
            let considered = !restrict_to_selection || line.selected;
            match CorrespondencePair::from_line(&line.vertices) {
                Some(pair) if considered => PairLine {
                    vertices: vec![pair.target, pair.target],
                    selected: line.selected,
                },
                _ => line.clone(),
            }
        })
        .collect()
}

fn considered_lines(
    lines: &[PairLine],
    restrict_to_selection: bool,
) -> impl Iterator<Item = (usize, &PairLine)> {
    lines
        .iter()
        .enumerate()
        .filter(move |(_, line)| !restrict_to_selection || line.selected)
}
