//! Wire messages of the extraction session.
//!
//! Client → worker, once after the socket opens: `{"polygon": <Feature>}`.
//! Worker → client, repeatedly:
//! `{"stage": "...", "progress": 0-100, "message"?: "...", "download_url"?: "..."}`.

use osm_extractor_geo::Feature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named phase of an extraction.
///
/// Ordered, but the worker may skip stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStage {
    /// No session
    #[default]
    Idle,
    /// Socket being opened
    Connecting,
    /// Worker is fetching source data
    Downloading,
    /// Worker is clipping to the polygon
    Clipping,
    /// Worker is building the road graph
    BuildingGraph,
    /// Artifact ready
    Complete,
    /// Session failed
    Error,
}

impl ExtractionStage {
    /// Wire name of the stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Downloading => "downloading",
            Self::Clipping => "clipping",
            Self::BuildingGraph => "building_graph",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    /// Human-readable label for progress displays.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Connecting => "Connecting...",
            Self::Downloading => "Downloading",
            Self::Clipping => "Clipping",
            Self::BuildingGraph => "Building Graph",
            Self::Complete => "Complete",
            Self::Error => "Error",
        }
    }

    /// True while a session is running and not yet finished.
    #[must_use]
    pub fn is_in_flight(self) -> bool {
        !matches!(self, Self::Idle | Self::Complete | Self::Error)
    }
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload sent once the socket is open.
#[derive(Debug, Serialize)]
pub struct ExtractRequest<'a> {
    /// Closed polygon feature
    pub polygon: &'a Feature,
}

/// Progress event sent by the worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerMessage {
    /// Stage the worker is in
    pub stage: ExtractionStage,
    /// Percentage, absent or null read as 0
    #[serde(default)]
    pub progress: Option<f64>,
    /// Optional status text
    #[serde(default)]
    pub message: Option<String>,
    /// Artifact reference, only meaningful with `complete`
    #[serde(default, rename = "download_url", alias = "download_reference")]
    pub download_reference: Option<String>,
}

impl WorkerMessage {
    /// Parses a text frame.
    ///
    /// `idle` is a client-side state; the worker never reports it.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        let message: Self = serde_json::from_str(text)?;
        if message.stage == ExtractionStage::Idle {
            return Err(serde::de::Error::custom("worker reported client-only stage `idle`"));
        }
        Ok(message)
    }

    /// Progress with the missing-value default applied.
    #[must_use]
    pub fn progress_or_zero(&self) -> f64 {
        self.progress.filter(|p| !p.is_nan()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osm_extractor_geo::{Coordinate, Geometry};

    #[test]
    fn test_worker_message_deserialize() {
        let msg = WorkerMessage::parse(
            r#"{"stage": "building_graph", "progress": 72.5, "message": "Building graph..."}"#,
        )
        .unwrap();
        assert_eq!(msg.stage, ExtractionStage::BuildingGraph);
        assert_eq!(msg.progress_or_zero(), 72.5);
        assert_eq!(msg.message.as_deref(), Some("Building graph..."));
        assert!(msg.download_reference.is_none());
    }

    #[test]
    fn test_complete_message_reads_download_url() {
        let msg = WorkerMessage::parse(
            r#"{"stage": "complete", "progress": 100, "download_url": "https://w/files/abc.graphml"}"#,
        )
        .unwrap();
        assert_eq!(msg.stage, ExtractionStage::Complete);
        assert_eq!(
            msg.download_reference.as_deref(),
            Some("https://w/files/abc.graphml")
        );

        let alias = WorkerMessage::parse(r#"{"stage": "complete", "download_reference": "abc"}"#).unwrap();
        assert_eq!(alias.download_reference.as_deref(), Some("abc"));
    }

    #[test]
    fn test_missing_progress_reads_zero() {
        let msg = WorkerMessage::parse(r#"{"stage": "clipping"}"#).unwrap();
        assert_eq!(msg.progress_or_zero(), 0.0);

        let null = WorkerMessage::parse(r#"{"stage": "clipping", "progress": null}"#).unwrap();
        assert_eq!(null.progress_or_zero(), 0.0);
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        assert!(WorkerMessage::parse(r#"{"stage": "uploading", "progress": 5}"#).is_err());
        assert!(WorkerMessage::parse("not json").is_err());
    }

    #[test]
    fn test_idle_stage_from_worker_is_rejected() {
        assert!(WorkerMessage::parse(r#"{"stage": "idle", "progress": 0}"#).is_err());
    }

    #[test]
    fn test_stage_wire_names() {
        for stage in [
            ExtractionStage::Idle,
            ExtractionStage::Connecting,
            ExtractionStage::Downloading,
            ExtractionStage::Clipping,
            ExtractionStage::BuildingGraph,
            ExtractionStage::Complete,
            ExtractionStage::Error,
        ] {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
        }
    }

    #[test]
    fn test_in_flight_stages() {
        assert!(!ExtractionStage::Idle.is_in_flight());
        assert!(ExtractionStage::Connecting.is_in_flight());
        assert!(ExtractionStage::BuildingGraph.is_in_flight());
        assert!(!ExtractionStage::Complete.is_in_flight());
        assert!(!ExtractionStage::Error.is_in_flight());
    }

    #[test]
    fn test_extract_request_shape() {
        let polygon = osm_extractor_geo::Feature::new(Geometry::Polygon {
            coordinates: vec![vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(0.0, 0.0),
            ]],
        });
        let value = serde_json::to_value(ExtractRequest { polygon: &polygon }).unwrap();
        assert_eq!(value["polygon"]["type"], "Feature");
        assert_eq!(value["polygon"]["geometry"]["type"], "Polygon");
    }
}
