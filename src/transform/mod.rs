//! Point transformers built from correspondence pairs.
//!
//! The number of pairs decides the transform class:
//!
//! | pairs | kind        | behaviour                                    |
//! |-------|-------------|----------------------------------------------|
//! | 0     | None        | nothing to do, the run is rejected           |
//! | 1     | Translation | shift by the single pair's offset            |
//! | 2     | Linear      | similarity (scale + rotation + translation)  |
//! | 3     | Affine      | exact affine map through the three pairs     |
//! | ≥ 4   | Bend        | piecewise affine over a Delaunay mesh        |
//!
//! A Bend needs triangulation support. When the probe reports it missing the
//! selector answers [`TransformKind::Unavailable`] instead of falling back to
//! an affine map.

mod affine;
#[cfg(feature = "triangulation")]
mod bend;
mod linear;
mod translation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{OffsetError, Point2, Tolerance};
use crate::pairs::CorrespondenceSet;

pub use affine::AffineTransformer;
#[cfg(feature = "triangulation")]
pub use bend::BendTransformer;
pub use linear::LinearTransformer;
pub use translation::TranslationTransformer;

#[cfg(feature = "triangulation")]
use crate::geom::MeshError;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("no correspondence pairs selected")]
    InsufficientPairs,
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },
    #[error("bending needs triangulation support, which is {support}")]
    CapabilityUnavailable { support: TriangulationSupport },
    #[error("{kind} transform expects {expected} pairs, got {found}")]
    PairCount {
        kind: TransformKind,
        expected: usize,
        found: usize,
    },
    #[error("{kind} transform needs at least {minimum} pairs, got {found}")]
    TooFewPairs {
        kind: TransformKind,
        minimum: usize,
        found: usize,
    },
    #[error("buffer distance must be finite and non-negative, got {0}")]
    InvalidBuffer(f64),
    #[error("pair line {index} has {vertex_count} vertices; at least 2 are required")]
    MalformedPair { index: usize, vertex_count: usize },
    #[error("failed to expand hull: {0}")]
    Offset(#[from] OffsetError),
    #[cfg(feature = "triangulation")]
    #[error("failed to build mesh: {0}")]
    Mesh(MeshError),
}

#[cfg(feature = "triangulation")]
impl From<MeshError> for TransformError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::NoTriangles => Self::degenerate(err.to_string()),
            other => Self::Mesh(other),
        }
    }
}

impl TransformError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateInput {
            reason: reason.into(),
        }
    }
}

pub type TransformResult<T> = Result<T, TransformError>;

// ============================================================================
// Kinds and capability probe
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    None,
    Translation,
    Linear,
    Affine,
    Bend,
    /// Four or more pairs, but triangulation support is missing.
    Unavailable,
}

impl TransformKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Translation => "translation",
            Self::Linear => "linear",
            Self::Affine => "affine",
            Self::Bend => "bend",
            Self::Unavailable => "unavailable",
        }
    }

    /// Whether a run can proceed with this kind.
    #[must_use]
    pub fn is_runnable(self) -> bool {
        !matches!(self, Self::None | Self::Unavailable)
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// State of the triangulation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriangulationSupport {
    Available,
    Missing,
    Outdated { found: String, required: String },
}

impl fmt::Display for TriangulationSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("available"),
            Self::Missing => f.write_str("missing (build with the `triangulation` feature)"),
            Self::Outdated { found, required } => {
                write!(f, "too old (found {found}, {required} required)")
            }
        }
    }
}

/// Optional capabilities of this build, probed once at start-up and handed
/// to [`select_kind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub triangulation: TriangulationSupport,
}

impl Capabilities {
    /// Reports what this build was compiled with.
    #[must_use]
    pub fn probe() -> Self {
        let triangulation = if cfg!(feature = "triangulation") {
            TriangulationSupport::Available
        } else {
            log::warn!("triangulation support is not compiled in; bending is unavailable");
            TriangulationSupport::Missing
        };
        Self { triangulation }
    }

    #[must_use]
    pub fn can_triangulate(&self) -> bool {
        self.triangulation == TriangulationSupport::Available
    }
}

/// Picks the transform class for `pair_count` pairs.
#[must_use]
pub fn select_kind(pair_count: usize, capabilities: &Capabilities) -> TransformKind {
    match pair_count {
        0 => TransformKind::None,
        1 => TransformKind::Translation,
        2 => TransformKind::Linear,
        3 => TransformKind::Affine,
        _ if capabilities.can_triangulate() => TransformKind::Bend,
        _ => TransformKind::Unavailable,
    }
}

// ============================================================================
// Transformer
// ============================================================================

/// A planar point mapping.
pub trait Transformer {
    fn map(&self, point: Point2) -> Point2;

    fn kind(&self) -> TransformKind;
}

/// Options for building a transformer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOptions {
    /// Distance by which the bend mesh is grown past the hull of the sources.
    /// Zero keeps the mesh on the hull itself.
    pub buffer: f64,
    pub tolerance: Tolerance,
}

impl TransformOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: 0.0,
            tolerance: Tolerance::default_geom(),
        }
    }

    #[must_use]
    pub const fn buffer(mut self, buffer: f64) -> Self {
        self.buffer = buffer;
        self
    }

    #[must_use]
    pub const fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// The transformer chosen for a run.
#[derive(Debug, Clone)]
pub enum PointTransformer {
    Translation(TranslationTransformer),
    Linear(LinearTransformer),
    Affine(AffineTransformer),
    #[cfg(feature = "triangulation")]
    Bend(BendTransformer),
}

impl PointTransformer {
    /// Selects and builds the transformer for `pairs`.
    ///
    /// # Errors
    /// Fails with [`TransformError::InsufficientPairs`] for an empty set,
    /// [`TransformError::CapabilityUnavailable`] when a bend is required but
    /// cannot be built, and with the variant's own construction errors.
    pub fn build(
        pairs: &CorrespondenceSet,
        options: TransformOptions,
        capabilities: &Capabilities,
    ) -> TransformResult<Self> {
        let kind = select_kind(pairs.len(), capabilities);
        log::info!("building {kind} transform from {} pairs", pairs.len());

        match kind {
            TransformKind::None => Err(TransformError::InsufficientPairs),
            TransformKind::Translation => {
                TranslationTransformer::new(pairs).map(Self::Translation)
            }
            TransformKind::Linear => {
                LinearTransformer::new(pairs, options.tolerance).map(Self::Linear)
            }
            TransformKind::Affine => {
                AffineTransformer::new(pairs, options.tolerance).map(Self::Affine)
            }
            TransformKind::Bend => Self::build_bend(pairs, options, capabilities),
            TransformKind::Unavailable => Err(TransformError::CapabilityUnavailable {
                support: capabilities.triangulation.clone(),
            }),
        }
    }

    #[cfg(feature = "triangulation")]
    fn build_bend(
        pairs: &CorrespondenceSet,
        options: TransformOptions,
        _capabilities: &Capabilities,
    ) -> TransformResult<Self> {
        BendTransformer::new(pairs, options.buffer, options.tolerance).map(Self::Bend)
    }

    #[cfg(not(feature = "triangulation"))]
    fn build_bend(
        _pairs: &CorrespondenceSet,
        _options: TransformOptions,
        capabilities: &Capabilities,
    ) -> TransformResult<Self> {
        // A host may claim support this build does not have.
        Err(TransformError::CapabilityUnavailable {
            support: match capabilities.triangulation {
                TriangulationSupport::Available => TriangulationSupport::Missing,
                ref other => other.clone(),
            },
        })
    }

    /// Preview structures for the shell. Empty for every kind but Bend.
    #[must_use]
    pub fn preview(&self) -> BendPreview {
        match self {
            #[cfg(feature = "triangulation")]
            Self::Bend(bend) => bend.preview(),
            _ => BendPreview::default(),
        }
    }
}

impl Transformer for PointTransformer {
    fn map(&self, point: Point2) -> Point2 {
        match self {
            Self::Translation(t) => t.map(point),
            Self::Linear(t) => t.map(point),
            Self::Affine(t) => t.map(point),
            #[cfg(feature = "triangulation")]
            Self::Bend(t) => t.map(point),
        }
    }

    fn kind(&self) -> TransformKind {
        match self {
            Self::Translation(_) => TransformKind::Translation,
            Self::Linear(_) => TransformKind::Linear,
            Self::Affine(_) => TransformKind::Affine,
            #[cfg(feature = "triangulation")]
            Self::Bend(_) => TransformKind::Bend,
        }
    }
}

/// Auxiliary bend structures for preview rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BendPreview {
    /// Convex hull of the pair sources, counter-clockwise and open.
    pub hull: Vec<Point2>,
    /// Hull grown by the buffer distance; `None` without a buffer.
    pub expanded_hull: Option<Vec<Point2>>,
    /// Mesh triangles with resolved source-side coordinates.
    pub triangles: Vec<[Point2; 3]>,
}

pub(crate) fn expect_pair_count(
    pairs: &CorrespondenceSet,
    kind: TransformKind,
    expected: usize,
) -> TransformResult<()> {
    if pairs.len() == expected {
        Ok(())
    } else {
        Err(TransformError::PairCount {
            kind,
            expected,
            found: pairs.len(),
        })
    }
}

#[cfg(feature = "triangulation")]
pub(crate) fn expect_min_pairs(
    pairs: &CorrespondenceSet,
    kind: TransformKind,
    minimum: usize,
) -> TransformResult<()> {
    if pairs.len() >= minimum {
        Ok(())
    } else {
        Err(TransformError::TooFewPairs {
            kind,
            minimum,
            found: pairs.len(),
        })
    }
}
