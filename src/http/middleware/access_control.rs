//! Access Control Middleware.
//! Rejects anonymous clients and requests without the API key.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::http::response::ErrorResponse;
use crate::security::api_key::constant_time_eq;

/// 400 unless the request names its client.
pub async fn require_user_agent(req: Request<Body>, next: Next) -> Response {
    let present = req
        .headers()
        .get(header::USER_AGENT)
        .is_some_and(|v| !v.as_bytes().is_empty());

    if !present {
        warn!(path = %req.uri().path(), "Rejected request without user agent");
        return ErrorResponse::bad_request(
            "User agent is missing. Please provide a valid user agent.",
        )
        .into_response();
    }

    next.run(req).await
}

/// 401 unless `Authorization` equals the expected bearer value exactly.
pub async fn require_api_key(
    State(expected): State<Arc<str>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if !constant_time_eq(provided, expected.as_bytes()) {
        warn!(path = %req.uri().path(), "Rejected request with invalid API key");
        return ErrorResponse::new(
            StatusCode::UNAUTHORIZED,
            "Invalid or missing API key. Please provide a valid API key.",
        )
        .into_response();
    }

    next.run(req).await
}
