//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, state swap)
//!     → request.rs (request ID, span)
//!     → handlers.rs (/images/{id}, passthrough paths, demo page)
//!     → delivery (fetch + derive)
//!     → response.rs (multipart stream, plain image, or relayed upstream reply)
//! ```

pub mod demo;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer, ServerError, ServiceState};
