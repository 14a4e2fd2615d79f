//! Canned responses produced by the gateway itself.
//!
//! Upstream and file responses pass through untouched; these cover the
//! answers the handlers give on their own.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Body of every authentication failure.
pub const UNAUTHORIZED_BODY: &str = "unauthorized request";

/// 401 with a fixed body, whatever the underlying cause.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        UNAUTHORIZED_BODY,
    )
        .into_response()
}

/// 202 with an empty body.
pub fn accepted() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::ACCEPTED;
    response
}

/// Plain-text error response.
pub fn error(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}
