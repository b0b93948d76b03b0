//! Progressive image edge service.
//!
//! Fetches an original image from an upstream origin, derives a small
//! variant, and streams both as frames of one
//! `multipart/x-mixed-replace` response.

pub mod config;
pub mod delivery;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;
pub mod streaming;
pub mod variant;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
