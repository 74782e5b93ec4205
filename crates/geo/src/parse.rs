//! Polygon input parsing.
//!
//! Accepts any of:
//! - A bare vertex list: `[[lng, lat], ...]`
//! - A GeoJSON Polygon geometry: `{"type": "Polygon", "coordinates": [[...]]}`
//! - A GeoJSON Feature wrapping a Polygon
//!
//! Rings that repeat their first vertex last are opened again, since the
//! closing vertex is always derived.

use crate::geojson::{Feature, Geometry};
use crate::{Coordinate, GeoError, Result};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum PolygonInput {
    Vertices(Vec<Coordinate>),
    Feature(Feature),
    Geometry(Geometry),
}

/// Parses polygon vertices from JSON text.
///
/// # Example
/// ```
/// use osm_extractor_geo::parse_vertices;
///
/// let vertices = parse_vertices("[[0, 0], [0, 1], [1, 1], [0, 0]]").unwrap();
/// assert_eq!(vertices.len(), 3);
/// ```
pub fn parse_vertices(json: &str) -> Result<Vec<Coordinate>> {
    let input: PolygonInput = serde_json::from_str(json)?;

    let mut vertices = match input {
        PolygonInput::Vertices(vertices) => vertices,
        PolygonInput::Feature(feature) => exterior_ring(feature.geometry)?,
        PolygonInput::Geometry(geometry) => exterior_ring(geometry)?,
    };

    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }

    if let Some(bad) = vertices.iter().find(|v| !v.is_valid()) {
        return Err(GeoError::InvalidCoordinate(format!(
            "[{}, {}] is outside WGS-84 bounds",
            bad.longitude, bad.latitude
        )));
    }

    Ok(vertices)
}

fn exterior_ring(geometry: Geometry) -> Result<Vec<Coordinate>> {
    match geometry {
        Geometry::Polygon { coordinates } => coordinates
            .into_iter()
            .next()
            .ok_or_else(|| GeoError::UnsupportedInput("polygon has no rings".into())),
        other => Err(GeoError::UnsupportedInput(format!(
            "expected a Polygon, got {}",
            geometry_name(&other)
        ))),
    }
}

fn geometry_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point { .. } => "Point",
        Geometry::LineString { .. } => "LineString",
        Geometry::MultiLineString { .. } => "MultiLineString",
        Geometry::Polygon { .. } => "Polygon",
    }
}
