//! Nested planar geometries and the vertex walker that maps them.
//!
//! Geometries use the GeoJSON layout (`{"type": "Polygon", "coordinates":
//! [[[x, y], ...], ...]}`) so documents from common GIS tooling load without
//! conversion. Only the planar `x, y` part of each coordinate is bent; any
//! further ordinates (`z`, `m`) ride along unchanged.

use serde::{Deserialize, Serialize};

use super::Point2;

/// A GeoJSON position: `[x, y, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Position {
    pub xy: Point2,
    /// Ordinates after `y`, in document order.
    pub extra: Vec<f64>,
}

impl Position {
    #[must_use]
    pub fn new(xy: Point2) -> Self {
        Self {
            xy,
            extra: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, extra: impl Into<Vec<f64>>) -> Self {
        self.extra = extra.into();
        self
    }

    fn map_xy<F>(&self, f: &mut F) -> Self
    where
        F: FnMut(Point2) -> Point2,
    {
        Self {
            xy: f(self.xy),
            extra: self.extra.clone(),
        }
    }
}

impl TryFrom<Vec<f64>> for Position {
    type Error = String;

    fn try_from(mut ordinates: Vec<f64>) -> Result<Self, Self::Error> {
        if ordinates.len() < 2 {
            return Err(format!(
                "a position needs at least 2 ordinates, got {}",
                ordinates.len()
            ));
        }
        let extra = ordinates.split_off(2);
        Ok(Self {
            xy: Point2::new(ordinates[0], ordinates[1]),
            extra,
        })
    }
}

impl From<Position> for Vec<f64> {
    fn from(position: Position) -> Self {
        let mut ordinates = Vec::with_capacity(2 + position.extra.len());
        ordinates.extend([position.xy.x, position.xy.y]);
        ordinates.extend(position.extra);
        ordinates
    }
}

impl From<Point2> for Position {
    fn from(xy: Point2) -> Self {
        Self::new(xy)
    }
}

/// A line string: ordered positions. A polygon ring is a closed line string
/// whose last position repeats the first.
pub type LineString = Vec<Position>;

/// Polygon rings; the first ring is the outer boundary, the rest are holes.
pub type PolygonRings = Vec<LineString>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(LineString),
    MultiLineString(Vec<LineString>),
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
}

impl Geometry {
    /// Returns a structurally identical geometry with the `x, y` of every
    /// vertex replaced by `f(vertex)`.
    ///
    /// Vertices are visited element-wise, closing ring vertices included, in
    /// document order.
    #[must_use]
    pub fn map_points<F>(&self, mut f: F) -> Self
    where
        F: FnMut(Point2) -> Point2,
    {
        match self {
            Self::Point(p) => Self::Point(p.map_xy(&mut f)),
            Self::MultiPoint(points) => Self::MultiPoint(map_line(points, &mut f)),
            Self::LineString(line) => Self::LineString(map_line(line, &mut f)),
            Self::MultiLineString(lines) => Self::MultiLineString(map_rings(lines, &mut f)),
            Self::Polygon(rings) => Self::Polygon(map_rings(rings, &mut f)),
            Self::MultiPolygon(polygons) => Self::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| map_rings(rings, &mut f))
                    .collect(),
            ),
        }
    }

    /// Planar part of all vertices in document order.
    pub fn points(&self) -> Box<dyn Iterator<Item = Point2> + '_> {
        match self {
            Self::Point(p) => Box::new(std::iter::once(p.xy)),
            Self::MultiPoint(points) | Self::LineString(points) => {
                Box::new(points.iter().map(|p| p.xy))
            }
            Self::MultiLineString(lines) | Self::Polygon(lines) => {
                Box::new(lines.iter().flatten().map(|p| p.xy))
            }
            Self::MultiPolygon(polygons) => {
                Box::new(polygons.iter().flatten().flatten().map(|p| p.xy))
            }
        }
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points().count()
    }

    /// The GeoJSON type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

fn map_line<F>(line: &[Position], f: &mut F) -> LineString
where
    F: FnMut(Point2) -> Point2,
{
    line.iter().map(|p| p.map_xy(f)).collect()
}

fn map_rings<F>(rings: &[LineString], f: &mut F) -> Vec<LineString>
where
    F: FnMut(Point2) -> Point2,
{
    rings.iter().map(|ring| map_line(ring, f)).collect()
}

/// The geometry attached to a feature.
///
/// Anything that does not parse as a [`Geometry`] (collections, curves,
/// `null`, positions with fewer than two ordinates) is kept verbatim and passes through a bend
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureGeometry {
    Known(Geometry),
    Passthrough(serde_json::Value),
}

impl FeatureGeometry {
    /// Maps the vertices of a known geometry; pass-through values are cloned.
    #[must_use]
    pub fn map_points<F>(&self, f: F) -> Self
    where
        F: FnMut(Point2) -> Point2,
    {
        match self {
            Self::Known(geometry) => Self::Known(geometry.map_points(f)),
            Self::Passthrough(value) => Self::Passthrough(value.clone()),
        }
    }

    #[must_use]
    pub fn as_geometry(&self) -> Option<&Geometry> {
        match self {
            Self::Known(geometry) => Some(geometry),
            Self::Passthrough(_) => None,
        }
    }
}

impl From<Geometry> for FeatureGeometry {
    fn from(geometry: Geometry) -> Self {
        Self::Known(geometry)
    }
}
