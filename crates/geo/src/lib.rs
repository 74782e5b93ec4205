//! Polygon authoring and geodesic measurement for the OSM extractor.
//!
//! This crate provides:
//! - A tap-driven polygon authoring state machine with snap-to-close
//! - Geodesic area, perimeter and bounding box of the drawn ring
//! - GeoJSON representations of the polygon for rendering and upload
//! - Haversine distance calculations
//!
//! # Example
//!
//! ```
//! use osm_extractor_geo::{compute_summary, Coordinate, PolygonAuthor};
//!
//! let mut author = PolygonAuthor::new();
//! author.start_drawing();
//! author.handle_tap(Coordinate::new(0.0, 0.0));
//! author.handle_tap(Coordinate::new(0.0, 1.0));
//! author.handle_tap(Coordinate::new(1.0, 1.0));
//! author.handle_tap(Coordinate::new(0.0001, 0.0001)); // snaps to the first vertex
//!
//! assert!(author.is_closed());
//! let summary = compute_summary(author.vertices(), author.is_closed()).unwrap();
//! assert_eq!(summary.vertex_count, 3);
//! ```

mod draw;
mod error;
pub mod geojson;
mod haversine;
pub mod measure;
mod parse;
mod view;

pub use draw::{DrawConfig, PolygonAuthor, TapOutcome, DEFAULT_SNAP_RADIUS_KM};
pub use error::{GeoError, GeoErrorCode, Result};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use haversine::{haversine_distance, path_length, EARTH_RADIUS_KM};
pub use measure::{
    compute_metrics, compute_metrics_with, compute_summary, compute_summary_with, BoundingBox,
    EarthModel, Measurements, Metrics, PolygonSummary,
};
pub use parse::parse_vertices;
pub use view::{MapView, DEFAULT_FLY_TO_ZOOM};

/// A geographic position in WGS-84 degrees, ordered `(longitude, latitude)`
/// like a GeoJSON position.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    ///
    /// # Arguments
    /// * `longitude` - Longitude in degrees (-180 to 180)
    /// * `latitude` - Latitude in degrees (-90 to 90)
    #[inline]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Returns true if the coordinate has finite, in-range values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Converts degrees to radians as `(lat, lon)` for internal calculations.
    #[inline]
    pub(crate) fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self::new(lon, lat)
    }
}

/// GeoJSON positions may carry an altitude; it is dropped.
impl TryFrom<Vec<f64>> for Coordinate {
    type Error = String;

    fn try_from(position: Vec<f64>) -> std::result::Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat] | [lon, lat, _] => Ok(Self::new(*lon, *lat)),
            other => Err(format!(
                "position must have 2 or 3 elements, got {}",
                other.len()
            )),
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.longitude, coord.latitude]
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self::new(lon, lat)
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(coord: Coordinate) -> Self {
        geo::Coord {
            x: coord.longitude,
            y: coord.latitude,
        }
    }
}

/// Builds the implicit closed ring of a vertex list: the vertices followed by
/// a repetition of the first one. Empty input yields an empty ring.
pub fn closed_ring(vertices: &[Coordinate]) -> Vec<Coordinate> {
    let mut ring = Vec::with_capacity(vertices.len() + 1);
    ring.extend_from_slice(vertices);
    if let Some(first) = vertices.first() {
        ring.push(*first);
    }
    ring
}
