//! Response construction.
//!
//! # Responsibilities
//! - Progressive multipart responses bound to the frame emitter
//! - Header-only progressive responses for HEAD
//! - Plain single-part responses for declined derivations
//! - Unmodified relays of upstream replies
//! - Map delivery errors to status codes
//!
//! # Design Decisions
//! - Every error here is produced before any body byte is written
//! - Upstream failure replies are relayed as-is (status, content type, body)

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::delivery::DeliveryError;
use crate::origin::{ImageResource, OriginError, UpstreamReply};
use crate::streaming::{progressive_body, FrameSequence, MULTIPART_CONTENT_TYPE};

/// `200 OK` with a `multipart/x-mixed-replace` body streaming `frames`.
pub fn progressive_response(frames: FrameSequence) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(MULTIPART_CONTENT_TYPE))],
        progressive_body(frames),
    )
        .into_response()
}

/// Progressive headers with no body, for `HEAD`; no emitter is started.
pub fn progressive_head_response() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(MULTIPART_CONTENT_TYPE))],
    )
        .into_response()
}

/// The original resource untouched, with its upstream status.
pub fn single_response(resource: &ImageResource) -> Response {
    let content_type = HeaderValue::from_str(resource.content_type())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    (
        resource.status(),
        [(header::CONTENT_TYPE, content_type)],
        Body::from(resource.bytes().clone()),
    )
        .into_response()
}

/// The upstream reply, relayed unmodified.
pub fn relay_response(reply: UpstreamReply) -> Response {
    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    if let Some(content_type) = reply.content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
}

impl IntoResponse for DeliveryError {
    fn into_response(self) -> Response {
        match self {
            DeliveryError::Origin(OriginError::Status(reply)) => relay_response(reply),
            DeliveryError::Origin(OriginError::InvalidIdentifier(_)) => {
                (StatusCode::BAD_REQUEST, "Invalid image identifier").into_response()
            }
            DeliveryError::Origin(
                OriginError::Unreachable { .. }
                | OriginError::MissingContentType
                | OriginError::InvalidContentType,
            ) => (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response(),
            DeliveryError::Origin(OriginError::InvalidBase(_) | OriginError::Client(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Origin misconfigured").into_response()
            }
            DeliveryError::Derivation(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Variant derivation failed").into_response()
            }
        }
    }
}
