//! Client for the OSM extraction worker
//!
//! Two routes are exposed by the worker:
//!
//! - `POST /preview` returns the road network inside a polygon
//! - `/ws/extract` streams extraction progress and ends with a download
//!   reference for the built road graph
//!
//! # Example
//!
//! ```rust,no_run
//! use osm_extractor_client::prelude::*;
//! use osm_extractor_geo::PolygonAuthor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExtractorClient::new()?;
//!     let mut session = client.extraction_session()?;
//!
//!     let polygon = PolygonAuthor::new().polygon_geojson();
//!     if let Some(polygon) = polygon {
//!         session.start(&polygon)?;
//!         let done = session.wait_until_settled().await;
//!         println!("{:?}", done.download_reference);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod session;

pub use client::ExtractorClient;
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use session::{ExtractionSession, ExtractionStage, SessionSnapshot};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::ExtractorClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::PreviewApi;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::session::{
        ExtractionProgress, ExtractionSession, ExtractionStage, PreviewState, SessionSnapshot,
    };
}
