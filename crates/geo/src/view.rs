//! Map view target.
//!
//! The core never asks for device location; a caller that has resolved one
//! hands it to [`MapView::fly_to`] and renders whatever the view says.

use crate::Coordinate;
use serde::{Deserialize, Serialize};

/// Zoom level used when recentering on a resolved location.
pub const DEFAULT_FLY_TO_ZOOM: f64 = 14.0;

/// Where the map camera should point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: f64,
    /// Bearing in degrees, 0 is north-up
    pub heading: f64,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Coordinate::new(0.0, 0.0),
            zoom: 1.0,
            heading: 0.0,
        }
    }
}

impl MapView {
    /// Recenters on a resolved location at street-level zoom.
    pub fn fly_to(&mut self, location: Coordinate) {
        self.center = location;
        self.zoom = DEFAULT_FLY_TO_ZOOM;
    }

    /// Turns the map back to north-up.
    pub fn reset_bearing(&mut self) {
        self.heading = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fly_to_keeps_heading() {
        let mut view = MapView {
            heading: 45.0,
            ..MapView::default()
        };
        view.fly_to(Coordinate::new(13.405, 52.52));
        assert_eq!(view.center, Coordinate::new(13.405, 52.52));
        assert_eq!(view.zoom, DEFAULT_FLY_TO_ZOOM);
        assert_eq!(view.heading, 45.0);

        view.reset_bearing();
        assert_eq!(view.heading, 0.0);
    }
}
