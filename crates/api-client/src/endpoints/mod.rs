//! Endpoint-specific API implementations
//!
//! | Module | Worker route | Description |
//! |--------|--------------|-------------|
//! | `preview` | `POST /preview` | Road network inside a polygon |
//!
//! The streaming `/ws/extract` route is driven by [`crate::session`].

pub mod preview;

pub use preview::PreviewApi;
