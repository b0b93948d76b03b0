//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::delivery::Delivery;
use crate::http::demo::DEMO_PAGE;
use crate::http::request::request_id;
use crate::http::response::{progressive_head_response, progressive_response, relay_response, single_response};
use crate::http::server::AppState;
use crate::observability::metrics;

/// `GET /images/{id}`: progressive delivery with plain fallback.
///
/// `HEAD` answers with the same status and headers but never starts a stream.
pub async fn image_handler(
    State(state): State<AppState>,
    method: Method,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);
    let service = state.current();

    let response = match service.delivery.deliver(&id).await {
        Ok(Delivery::Progressive(_)) if method == Method::HEAD => progressive_head_response(),
        Ok(Delivery::Progressive(frames)) => {
            tracing::debug!(request_id, identifier = %id, frames = frames.len(), "Starting progressive stream");
            progressive_response(frames)
        }
        Ok(Delivery::Single(resource)) => single_response(&resource),
        Err(e) => {
            tracing::warn!(request_id, identifier = %id, error = %e, "Image delivery failed");
            e.into_response()
        }
    };

    metrics::record_request("images", response.status().as_u16(), start);
    response
}

/// Fallback: configured passthrough paths, otherwise 404.
pub async fn passthrough_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let service = state.current();

    let Some(identifier) = service.passthrough_identifier(uri.path()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "Method not allowed",
        )
            .into_response();
    }

    let response = match service.delivery.passthrough(identifier).await {
        Ok(reply) => relay_response(reply),
        Err(e) => {
            tracing::warn!(
                request_id = request_id(&headers),
                path = %uri.path(),
                error = %e,
                "Passthrough failed"
            );
            e.into_response()
        }
    };

    metrics::record_request("passthrough", response.status().as_u16(), start);
    response
}

/// `GET /`: demo page, when enabled.
pub async fn demo_handler(State(state): State<AppState>) -> Response {
    if state.current().config.demo_page {
        Html(DEMO_PAGE).into_response()
    } else {
        (StatusCode::NOT_FOUND, "Not found").into_response()
    }
}
