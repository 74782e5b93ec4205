//! Geodesic polygon measurements.
//!
//! Area and perimeter are computed on a curved-earth model over the implicit
//! closed ring of a vertex list. Values are formatted to three decimals for
//! display. Degenerate input yields `None` instead of an error.

use crate::{closed_ring, path_length, Coordinate};
use geo::orient::Direction;
use geo::{BoundingRect, ChamberlainDuquetteArea, GeodesicArea, LineString, Orient, Polygon};
use serde::{Deserialize, Serialize};

/// Minimum number of vertices for any measurement.
const MIN_VERTICES: usize = 3;

const SQ_METERS_PER_SQ_KM: f64 = 1_000_000.0;
const METERS_PER_KM: f64 = 1_000.0;

/// Earth model used for area and perimeter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarthModel {
    /// Spherical area (Chamberlain-Duquette, WGS-84 equatorial radius) and
    /// haversine edge lengths on the mean radius
    #[default]
    Spherical,
    /// Karney geodesics on the WGS-84 ellipsoid
    Ellipsoidal,
}

/// Live measurements of a polygon with at least three vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Area in square kilometers, three decimals
    pub area_km2: String,
    /// Perimeter in kilometers, three decimals
    pub perimeter_km: String,
}

/// Axis-aligned bounding box of the closed ring.
///
/// Serialized as `[minLon, minLat, maxLon, maxLat]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// South-west corner.
    pub fn south_west(&self) -> Coordinate {
        Coordinate::new(self.min_lon, self.min_lat)
    }

    /// North-east corner.
    pub fn north_east(&self) -> Coordinate {
        Coordinate::new(self.max_lon, self.max_lat)
    }

    /// Midpoint of the box in degree space.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([min_lon, min_lat, max_lon, max_lat]: [f64; 4]) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat]
    }
}

/// Finalized description of a closed polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonSummary {
    /// Number of distinct vertices (the closing repetition is not counted)
    pub vertex_count: usize,
    /// Bounding box of the ring
    pub bbox: BoundingBox,
    /// Area in square kilometers, three decimals
    pub area_km2: String,
    /// Perimeter in kilometers, three decimals
    pub perimeter_km: String,
}

/// Computes live metrics on the default spherical model.
///
/// Returns `None` below three vertices or for degenerate input.
///
/// # Example
/// ```
/// use osm_extractor_geo::{compute_metrics, Coordinate};
///
/// let vertices = [
///     Coordinate::new(0.0, 0.0),
///     Coordinate::new(0.0, 1.0),
///     Coordinate::new(1.0, 1.0),
/// ];
/// let metrics = compute_metrics(&vertices).unwrap();
/// assert!(metrics.area_km2.parse::<f64>().unwrap() > 0.0);
/// ```
pub fn compute_metrics(vertices: &[Coordinate]) -> Option<Metrics> {
    compute_metrics_with(vertices, EarthModel::default())
}

/// Computes live metrics on the given earth model.
pub fn compute_metrics_with(vertices: &[Coordinate], model: EarthModel) -> Option<Metrics> {
    let (area_km2, perimeter_km) = measure_ring(vertices, model)?;
    Some(Metrics {
        area_km2: format_km(area_km2),
        perimeter_km: format_km(perimeter_km),
    })
}

/// Computes the closed-polygon summary on the default spherical model.
///
/// Returns `None` unless `closed` is set and metrics are computable.
pub fn compute_summary(vertices: &[Coordinate], closed: bool) -> Option<PolygonSummary> {
    compute_summary_with(vertices, closed, EarthModel::default())
}

/// Computes the closed-polygon summary on the given earth model.
pub fn compute_summary_with(
    vertices: &[Coordinate],
    closed: bool,
    model: EarthModel,
) -> Option<PolygonSummary> {
    if !closed {
        return None;
    }

    let metrics = compute_metrics_with(vertices, model)?;
    let rect = to_polygon(vertices).bounding_rect()?;

    Some(PolygonSummary {
        vertex_count: vertices.len(),
        bbox: BoundingBox {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        },
        area_km2: metrics.area_km2,
        perimeter_km: metrics.perimeter_km,
    })
}

/// Returns `(area_km2, perimeter_km)` of the closed ring.
fn measure_ring(vertices: &[Coordinate], model: EarthModel) -> Option<(f64, f64)> {
    if vertices.len() < MIN_VERTICES {
        return None;
    }
    if vertices
        .iter()
        .any(|v| !v.longitude.is_finite() || !v.latitude.is_finite())
    {
        return None;
    }

    let (area_km2, perimeter_km) = match model {
        EarthModel::Spherical => {
            let area = to_polygon(vertices).chamberlain_duquette_unsigned_area();
            (area / SQ_METERS_PER_SQ_KM, path_length(&closed_ring(vertices)))
        }
        EarthModel::Ellipsoidal => {
            // Karney's area takes the exterior ring as counter-clockwise.
            let (perimeter, area) = to_polygon(vertices)
                .orient(Direction::Default)
                .geodesic_perimeter_area_unsigned();
            (area / SQ_METERS_PER_SQ_KM, perimeter / METERS_PER_KM)
        }
    };

    // All vertices coincident: there is no ring to measure.
    if !area_km2.is_finite() || !perimeter_km.is_finite() || perimeter_km <= 0.0 {
        return None;
    }

    Some((area_km2, perimeter_km))
}

fn to_polygon(vertices: &[Coordinate]) -> Polygon<f64> {
    let ring: LineString<f64> = closed_ring(vertices).into_iter().collect();
    Polygon::new(ring, vec![])
}

fn format_km(value: f64) -> String {
    format!("{value:.3}")
}

/// Memoized measurements keyed on the vertex list and closed flag.
///
/// Rendering layers can call [`Measurements::refresh`] on every frame; the
/// geodesic computation only reruns when the input changes.
#[derive(Debug, Clone, Default)]
pub struct Measurements {
    model: EarthModel,
    key: Option<(Vec<Coordinate>, bool)>,
    metrics: Option<Metrics>,
    summary: Option<PolygonSummary>,
}

impl Measurements {
    /// Creates an empty cache for the given earth model.
    pub fn new(model: EarthModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Recomputes if the input differs from the cached key.
    ///
    /// Returns true when a recomputation happened.
    pub fn refresh(&mut self, vertices: &[Coordinate], closed: bool) -> bool {
        if let Some((cached, cached_closed)) = &self.key {
            if cached.as_slice() == vertices && *cached_closed == closed {
                return false;
            }
        }

        self.metrics = compute_metrics_with(vertices, self.model);
        self.summary = compute_summary_with(vertices, closed, self.model);
        self.key = Some((vertices.to_vec(), closed));
        true
    }

    /// Cached metrics from the last refresh.
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Cached summary from the last refresh.
    pub fn summary(&self) -> Option<&PolygonSummary> {
        self.summary.as_ref()
    }

    /// Earth model in use.
    pub fn model(&self) -> EarthModel {
        self.model
    }
}
