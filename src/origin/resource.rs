//! Upstream replies and the image resources built from them.

use axum::http::{HeaderValue, StatusCode};
use bytes::Bytes;

use crate::origin::OriginError;

/// A raw upstream response, kept intact so it can be relayed unmodified.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

/// An original image fetched from the origin.
///
/// Immutable once built; the length is always the byte count of `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResource {
    status: StatusCode,
    bytes: Bytes,
    content_type: String,
}

impl ImageResource {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    /// Build a resource from a successful upstream reply.
    ///
    /// A non-success reply is handed back untouched inside `OriginError::Status`.
    pub fn from_reply(reply: UpstreamReply) -> Result<Self, OriginError> {
        if !reply.status.is_success() {
            return Err(OriginError::Status(reply));
        }

        let content_type = match &reply.content_type {
            None => return Err(OriginError::MissingContentType),
            Some(value) => value
                .to_str()
                .map_err(|_| OriginError::InvalidContentType)?
                .trim()
                .to_string(),
        };
        if content_type.is_empty() {
            return Err(OriginError::MissingContentType);
        }

        Ok(Self {
            status: reply.status,
            bytes: reply.body,
            content_type,
        })
    }

    /// The upstream success status (any 2xx).
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
