//! Road preview endpoint

use crate::client::ExtractorClient;
use crate::error::ApiResult;
use crate::session::PreviewSource;
use osm_extractor_geo::{Feature, FeatureCollection};
use serde::Serialize;

/// Road preview API interface
#[derive(Clone)]
pub struct PreviewApi {
    client: ExtractorClient,
}

/// Body of a preview request
#[derive(Debug, Serialize)]
struct PreviewRequest<'a> {
    polygon: &'a Feature,
}

impl PreviewApi {
    /// Create a new preview API interface
    pub(crate) fn new(client: ExtractorClient) -> Self {
        Self { client }
    }

    /// Fetch the road network inside `polygon` as line features
    pub async fn roads(&self, polygon: &Feature) -> ApiResult<FeatureCollection> {
        let url = self.client.config().preview_url();
        self.client.post_url(&url, &PreviewRequest { polygon }).await
    }
}

impl PreviewSource for PreviewApi {
    async fn fetch_roads(&self, polygon: &Feature) -> ApiResult<FeatureCollection> {
        self.roads(polygon).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osm_extractor_geo::{Coordinate, Geometry};

    #[test]
    fn test_request_body_wraps_polygon() {
        let polygon = Feature::new(Geometry::Polygon {
            coordinates: vec![vec![
                Coordinate::new(13.0, 52.0),
                Coordinate::new(13.1, 52.0),
                Coordinate::new(13.1, 52.1),
                Coordinate::new(13.0, 52.0),
            ]],
        });
        let body = serde_json::to_value(PreviewRequest { polygon: &polygon }).unwrap();
        assert_eq!(body["polygon"]["geometry"]["coordinates"][0][1][0], 13.1);
    }

    #[test]
    fn test_response_parses_as_feature_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"highway": "residential"},
                "geometry": {"type": "LineString", "coordinates": [[13.0, 52.0], [13.01, 52.01]]}
            }]
        }"#;
        let roads: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(roads.len(), 1);
        assert_eq!(roads.features[0].properties["highway"], "residential");
    }
}
