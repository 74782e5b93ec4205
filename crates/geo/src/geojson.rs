//! Minimal GeoJSON types.
//!
//! Covers what the authoring layer emits and what the road preview returns:
//! - `{"type": "Feature", "properties": {...}, "geometry": {...}}`
//! - `{"type": "FeatureCollection", "features": [...]}`

use crate::Coordinate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position
    Point {
        /// `[lng, lat]`
        coordinates: Coordinate,
    },
    /// An open or closed polyline
    LineString {
        /// Ordered positions
        coordinates: Vec<Coordinate>,
    },
    /// Several polylines, as returned for split roads
    MultiLineString {
        /// One position list per line
        coordinates: Vec<Vec<Coordinate>>,
    },
    /// Exterior ring followed by optional holes
    Polygon {
        /// Rings; each ring repeats its first position last
        coordinates: Vec<Vec<Coordinate>>,
    },
}

/// GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    /// Free-form properties object
    #[serde(default = "empty_properties")]
    pub properties: Value,
    /// Geometry of the feature
    pub geometry: Geometry,
}

impl Feature {
    /// Creates a feature with an empty properties object.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            properties: empty_properties(),
            geometry,
        }
    }

    /// Creates a feature with the given properties.
    pub fn with_properties(geometry: Geometry, properties: Value) -> Self {
        Self { properties, geometry }
    }

    /// Returns the exterior ring if this is a polygon feature.
    pub fn exterior_ring(&self) -> Option<&[Coordinate]> {
        match &self.geometry {
            Geometry::Polygon { coordinates } => coordinates.first().map(Vec::as_slice),
            _ => None,
        }
    }
}

/// GeoJSON feature collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    /// Member features
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// An empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A collection holding a single feature.
    pub fn single(feature: Feature) -> Self {
        Self {
            features: vec![feature],
        }
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true when there are no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn empty_properties() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_serializes_with_type_tags() {
        let feature = Feature::new(Geometry::Point {
            coordinates: Coordinate::new(13.405, 52.52),
        });
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "Point", "coordinates": [13.405, 52.52]}
            })
        );
    }

    #[test]
    fn test_road_preview_deserialize() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"class": "residential"},
                    "geometry": {"type": "LineString", "coordinates": [[0.1, 0.1], [0.2, 0.2]]}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "MultiLineString", "coordinates": [[[0.3, 0.3], [0.4, 0.4]]]}
                }
            ]
        }"#;

        let roads: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(roads.len(), 2);
        assert_eq!(roads.features[0].properties["class"], "residential");
        assert_eq!(roads.features[1].properties, json!({}));
    }

    #[test]
    fn test_road_preview_with_altitudes() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {"type": "LineString", "coordinates": [[0.1, 0.1, 12.0], [0.2, 0.2, 13.0]]}
            }]
        }"#;

        let roads: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(
            roads.features[0].geometry,
            Geometry::LineString {
                coordinates: vec![Coordinate::new(0.1, 0.1), Coordinate::new(0.2, 0.2)],
            }
        );
    }

    #[test]
    fn test_exterior_ring() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let feature = Feature::new(Geometry::Polygon {
            coordinates: vec![ring.clone()],
        });
        assert_eq!(feature.exterior_ring(), Some(ring.as_slice()));

        let line = Feature::new(Geometry::LineString { coordinates: ring });
        assert!(line.exterior_ring().is_none());
    }
}
