//! Tap-driven polygon authoring.
//!
//! The author accumulates vertices while drawing and closes the ring when a
//! tap lands within the snap radius of the first vertex. Invalid operations
//! are silent no-ops so touch input stays forgiving.

use crate::geojson::{Feature, FeatureCollection, Geometry};
use crate::{closed_ring, haversine_distance, Coordinate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Default snap-to-close radius in kilometers (50 m).
pub const DEFAULT_SNAP_RADIUS_KM: f64 = 0.05;

/// Vertices required before snap-to-close is considered.
const MIN_CLOSABLE_VERTICES: usize = 3;

/// Authoring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawConfig {
    /// A tap closer than this to the first vertex closes the polygon
    #[serde(default = "default_snap_radius_km")]
    pub snap_radius_km: f64,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            snap_radius_km: DEFAULT_SNAP_RADIUS_KM,
        }
    }
}

fn default_snap_radius_km() -> f64 {
    DEFAULT_SNAP_RADIUS_KM
}

/// What a tap did to the polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Not drawing, or already closed
    Ignored,
    /// The tap became a new vertex
    Appended,
    /// The tap snapped to the first vertex and closed the ring
    Closed,
}

/// Owns the vertex list and the drawing/closed flags.
///
/// Invariants: `closed` implies `!drawing` and at least three vertices. The
/// ring is never stored closed; see [`closed_ring`].
#[derive(Debug, Clone, Default)]
pub struct PolygonAuthor {
    vertices: Vec<Coordinate>,
    drawing: bool,
    closed: bool,
    config: DrawConfig,
}

impl PolygonAuthor {
    /// Creates an idle author with the default snap radius.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle author with a custom configuration.
    pub fn with_config(config: DrawConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Discards any previous polygon and starts accepting taps.
    pub fn start_drawing(&mut self) {
        self.vertices.clear();
        self.closed = false;
        self.drawing = true;
    }

    /// Stops accepting taps, keeping the vertices collected so far.
    pub fn stop_drawing(&mut self) {
        self.drawing = false;
    }

    /// Resets to the empty, idle state.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.closed = false;
        self.drawing = false;
    }

    /// Consumes a resolved map tap.
    ///
    /// With more than two vertices, a tap strictly within the snap radius of
    /// the first vertex closes the polygon and is not appended. Only the first
    /// vertex is checked.
    pub fn handle_tap(&mut self, coord: Coordinate) -> TapOutcome {
        if !self.drawing || self.closed {
            return TapOutcome::Ignored;
        }

        if self.vertices.len() >= MIN_CLOSABLE_VERTICES {
            let distance = haversine_distance(&self.vertices[0], &coord);
            if distance < self.config.snap_radius_km {
                self.closed = true;
                self.drawing = false;
                debug!(
                    vertices = self.vertices.len(),
                    snap_distance_km = distance,
                    "Polygon closed"
                );
                return TapOutcome::Closed;
            }
        }

        self.vertices.push(coord);
        TapOutcome::Appended
    }

    /// Current vertices, in tap order.
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    /// Whether taps are being accepted.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Whether the ring has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Active configuration.
    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    /// Outline for rendering: the open polyline while drawing, the closed
    /// ring once closed, empty below two vertices.
    pub fn line_geojson(&self) -> FeatureCollection {
        if self.vertices.len() < 2 {
            return FeatureCollection::empty();
        }

        let coordinates = if self.closed {
            closed_ring(&self.vertices)
        } else {
            self.vertices.clone()
        };

        FeatureCollection::single(Feature::new(Geometry::LineString { coordinates }))
    }

    /// Filled area for rendering; empty until the polygon is closed.
    pub fn fill_geojson(&self) -> FeatureCollection {
        self.polygon_geojson()
            .map(FeatureCollection::single)
            .unwrap_or_default()
    }

    /// One point per vertex, tagged with `index` and `isFirst`.
    pub fn vertices_geojson(&self) -> FeatureCollection {
        let features = self
            .vertices
            .iter()
            .enumerate()
            .map(|(index, coord)| {
                Feature::with_properties(
                    Geometry::Point { coordinates: *coord },
                    json!({ "index": index, "isFirst": index == 0 }),
                )
            })
            .collect();

        FeatureCollection { features }
    }

    /// The finalized polygon, present only once closed with three or more
    /// vertices. This is the payload for preview and extraction.
    pub fn polygon_geojson(&self) -> Option<Feature> {
        if !self.closed || self.vertices.len() < MIN_CLOSABLE_VERTICES {
            return None;
        }

        Some(Feature::new(Geometry::Polygon {
            coordinates: vec![closed_ring(&self.vertices)],
        }))
    }
}
