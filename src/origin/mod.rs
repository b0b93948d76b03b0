//! Origin fetching subsystem.
//!
//! # Data Flow
//! ```text
//! identifier (one path segment)
//!     → resolve.rs (validate, join with base, same-origin check)
//!     → fetcher.rs (GET upstream)
//!     → resource.rs (UpstreamReply → ImageResource, or pass-through error)
//! ```

pub mod fetcher;
pub mod resolve;
pub mod resource;

use thiserror::Error;

pub use fetcher::OriginFetcher;
pub use resolve::{resolve, validate_identifier};
pub use resource::{ImageResource, UpstreamReply};

/// Errors produced while retrieving an original.
#[derive(Debug, Error)]
pub enum OriginError {
    /// The identifier is not a plain path segment under the base.
    #[error("invalid image identifier '{0}'")]
    InvalidIdentifier(String),

    /// The configured base location does not parse.
    #[error("invalid origin base url: {0}")]
    InvalidBase(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("failed to build origin client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connecting to or reading from the origin failed.
    #[error("origin unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The origin answered with a non-success status.
    #[error("origin returned {}", .0.status)]
    Status(UpstreamReply),

    /// The origin reply carries no content type.
    #[error("origin reply has no content type")]
    MissingContentType,

    /// The origin content type is not visible ASCII.
    #[error("origin reply has an invalid content type")]
    InvalidContentType,
}
