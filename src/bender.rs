//! One bending run over a layer of features.
//!
//! A [`Bender`] is built from the pairs layer and the run options. Every
//! check that can fail (pair lines, transform selection, mesh construction)
//! happens in [`Bender::new`], so by the time features are walked the run
//! cannot fail part-way.

use serde::{Deserialize, Serialize};

use crate::geom::FeatureGeometry;
use crate::pairs::{CorrespondenceSet, PairLine, pairs_to_pins};
use crate::transform::{
    BendPreview, Capabilities, PointTransformer, TransformError, TransformKind, TransformOptions,
    TransformResult, Transformer, select_kind,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A feature of the layer to bend.
///
/// Only `geometry` is read. Every other member (`type`, `properties`,
/// foreign members) is kept in `members` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
    pub geometry: FeatureGeometry,
    #[serde(flatten)]
    pub members: serde_json::Map<String, serde_json::Value>,
}

impl Feature {
    #[must_use]
    pub fn new(geometry: impl Into<FeatureGeometry>) -> Self {
        Self {
            id: None,
            selected: false,
            geometry: geometry.into(),
            members: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

/// Options of a bending run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Read only the selected pair lines.
    pub restrict_pairs_to_selection: bool,
    /// Bend only the selected features; the others are returned unchanged.
    pub restrict_features_to_selection: bool,
    /// Width of the fixed band around the pairs' hull (bend only).
    pub buffer: f64,
    /// Collapse the used pair lines onto their targets after the run.
    pub pairs_to_pins: bool,
}

impl RunOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            restrict_pairs_to_selection: false,
            restrict_features_to_selection: false,
            buffer: 0.0,
            pairs_to_pins: false,
        }
    }

    #[must_use]
    pub const fn restrict_pairs_to_selection(mut self, restrict: bool) -> Self {
        self.restrict_pairs_to_selection = restrict;
        self
    }

    #[must_use]
    pub const fn restrict_features_to_selection(mut self, restrict: bool) -> Self {
        self.restrict_features_to_selection = restrict;
        self
    }

    #[must_use]
    pub const fn buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer;
        self
    }

    #[must_use]
    pub const fn pairs_to_pins(mut self, enabled: bool) -> Self {
        self.pairs_to_pins = enabled;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of [`Bender::bend_features`]: features done and total.
pub type Progress<'a> = &'a mut dyn FnMut(usize, usize);

/// Reports the transform kind the given pair lines would produce, without
/// building anything. Shells use this to reflect the state before a run.
///
/// # Errors
/// Returns an error when a considered pair line is malformed.
pub fn determine_kind(
    pair_lines: &[PairLine],
    options: &RunOptions,
    capabilities: &Capabilities,
) -> TransformResult<TransformKind> {
    let pairs = CorrespondenceSet::from_lines(pair_lines, options.restrict_pairs_to_selection)?;
    Ok(select_kind(pairs.len(), capabilities))
}

#[derive(Debug, Clone)]
pub struct Bender {
    options: RunOptions,
    pairs: CorrespondenceSet,
    transformer: PointTransformer,
}

impl Bender {
    /// Reads the pairs and builds the transformer.
    ///
    /// # Errors
    /// See [`PointTransformer::build`] and [`CorrespondenceSet::from_lines`].
    pub fn new(
        pair_lines: &[PairLine],
        options: RunOptions,
        capabilities: &Capabilities,
    ) -> TransformResult<Self> {
        if !options.buffer.is_finite() || options.buffer < 0.0 {
            return Err(TransformError::InvalidBuffer(options.buffer));
        }
        let pairs = CorrespondenceSet::from_lines(pair_lines, options.restrict_pairs_to_selection)?;
        let transformer = PointTransformer::build(
            &pairs,
            TransformOptions::new().buffer(options.buffer),
            capabilities,
        )?;
        Ok(Self {
            options,
            pairs,
            transformer,
        })
    }

    #[must_use]
    pub fn kind(&self) -> TransformKind {
        self.transformer.kind()
    }

    #[must_use]
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    #[must_use]
    pub fn pairs(&self) -> &CorrespondenceSet {
        &self.pairs
    }

    #[must_use]
    pub fn transformer(&self) -> &PointTransformer {
        &self.transformer
    }

    #[must_use]
    pub fn preview(&self) -> BendPreview {
        self.transformer.preview()
    }

    /// Bends `features`, returning them in the same order.
    ///
    /// `progress` is called with `(done, total)` after each feature, or once
    /// at the end when features are bent in parallel.
    #[must_use]
    pub fn bend_features(&self, features: &[Feature], progress: Option<Progress<'_>>) -> Vec<Feature> {
        let total = features.len();
        log::info!(
            "bending {total} features with a {} transform (restricted: {})",
            self.kind(),
            self.options.restrict_features_to_selection
        );
        let bent = self.walk_features(features, progress);
        log::debug!("bent {} features", bent.len());
        bent
    }

    #[cfg(not(feature = "parallel"))]
    fn walk_features(&self, features: &[Feature], mut progress: Option<Progress<'_>>) -> Vec<Feature> {
        let total = features.len();
        features
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let bent = self.bend_feature(feature);
                if let Some(report) = progress.as_deref_mut() {
                    report(i + 1, total);
                }
                bent
            })
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn walk_features(&self, features: &[Feature], progress: Option<Progress<'_>>) -> Vec<Feature> {
        let bent: Vec<Feature> = features.par_iter().map(|f| self.bend_feature(f)).collect();
        if let Some(report) = progress {
            report(bent.len(), bent.len());
        }
        bent
    }

    fn bend_feature(&self, feature: &Feature) -> Feature {
        if self.options.restrict_features_to_selection && !feature.selected {
            return feature.clone();
        }
        Feature {
            id: feature.id.clone(),
            selected: feature.selected,
            geometry: feature.geometry.map_points(|p| self.transformer.map(p)),
            members: feature.members.clone(),
        }
    }

    /// The pair lines after the run: collapsed to pins when
    /// [`RunOptions::pairs_to_pins`] is set, unchanged otherwise.
    #[must_use]
    pub fn pins(&self, pair_lines: &[PairLine]) -> Vec<PairLine> {
        if self.options.pairs_to_pins {
            pairs_to_pins(pair_lines, self.options.restrict_pairs_to_selection)
        } else {
            pair_lines.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Geometry, Point2};

    fn caps() -> Capabilities {
        Capabilities::probe()
    }

    fn pair(sx: f64, sy: f64, tx: f64, ty: f64) -> PairLine {
        PairLine::new(Point2::new(sx, sy), Point2::new(tx, ty))
    }

    #[test]
    fn translation_run_moves_every_vertex() {
        let bender = Bender::new(&[pair(0.0, 0.0, 10.0, 10.0)], RunOptions::new(), &caps()).unwrap();
        let features = vec![Feature::new(Geometry::LineString(vec![
            Point2::new(0.0, 0.0).into(),
            Point2::new(5.0, 5.0).into(),
        ]))];

        let bent = bender.bend_features(&features, None);
        assert_eq!(
            bent[0].geometry.as_geometry(),
            Some(&Geometry::LineString(vec![
                Point2::new(10.0, 10.0).into(),
                Point2::new(15.0, 15.0).into()
            ]))
        );
    }

    #[test]
    fn unselected_features_are_kept_when_restricted() {
        let options = RunOptions::new().restrict_features_to_selection(true);
        let bender = Bender::new(&[pair(0.0, 0.0, 1.0, 0.0)], options, &caps()).unwrap();
        let features = vec![
            Feature::new(Geometry::Point(Point2::new(0.0, 0.0).into())).selected(true),
            Feature::new(Geometry::Point(Point2::new(0.0, 0.0).into())),
        ];

        let bent = bender.bend_features(&features, None);
        assert_eq!(bent[0].geometry, Geometry::Point(Point2::new(1.0, 0.0).into()).into());
        assert_eq!(bent[1], features[1]);
    }

    #[test]
    fn progress_reaches_total() {
        let bender = Bender::new(&[pair(0.0, 0.0, 1.0, 1.0)], RunOptions::new(), &caps()).unwrap();
        let features = vec![Feature::new(Geometry::Point(Point2::ORIGIN.into())); 3];
        let mut last = (0, 0);
        let mut report = |done: usize, total: usize| last = (done, total);

        let _ = bender.bend_features(&features, Some(&mut report));
        assert_eq!(last, (3, 3));
    }

    #[test]
    fn construction_errors_surface_before_walking() {
        assert!(matches!(
            Bender::new(&[], RunOptions::new(), &caps()),
            Err(TransformError::InsufficientPairs)
        ));
        assert!(matches!(
            Bender::new(&[pair(0.0, 0.0, 1.0, 1.0)], RunOptions::new().buffer(f64::NAN), &caps()),
            Err(TransformError::InvalidBuffer(_))
        ));
    }

    #[test]
    fn determine_kind_honours_pair_selection() {
        let lines = vec![
            pair(0.0, 0.0, 1.0, 1.0).selected(true),
            pair(1.0, 0.0, 2.0, 1.0).selected(true),
            pair(0.0, 1.0, 1.0, 2.0),
        ];
        let all = determine_kind(&lines, &RunOptions::new(), &caps()).unwrap();
        assert_eq!(all, TransformKind::Affine);
        let selected = determine_kind(
            &lines,
            &RunOptions::new().restrict_pairs_to_selection(true),
            &caps(),
        )
        .unwrap();
        assert_eq!(selected, TransformKind::Linear);
    }

    #[test]
    fn pins_only_when_requested() {
        let lines = vec![pair(0.0, 0.0, 3.0, 4.0)];
        let plain = Bender::new(&lines, RunOptions::new(), &caps()).unwrap();
        assert_eq!(plain.pins(&lines), lines);

        let pinning = Bender::new(&lines, RunOptions::new().pairs_to_pins(true), &caps()).unwrap();
        assert_eq!(
            pinning.pins(&lines)[0].vertices,
            vec![Point2::new(3.0, 4.0), Point2::new(3.0, 4.0)]
        );
    }

    #[test]
    fn run_options_deserialize_with_defaults() {
        let options: RunOptions = serde_json::from_str(r#"{"buffer": 2.5}"#).unwrap();
        assert_eq!(options, RunOptions::new().buffer(2.5));
    }
}
