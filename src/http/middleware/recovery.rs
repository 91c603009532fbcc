//! Panic and timeout isolation.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use tower::BoxError;

use crate::http::response::ErrorResponse;

/// Log a recovered panic and answer with a generic 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "Recovered from panic in request handler");

    ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error. Please try again later.",
    )
    .into_response()
}

/// Answer a request that outlived the request timeout.
///
/// Used with `HandleErrorLayer` over `tower::timeout`; any other service
/// error is reported as a generic 500.
pub async fn handle_timeout(err: BoxError) -> ErrorResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        return ErrorResponse::new(
            StatusCode::REQUEST_TIMEOUT,
            "The request took too long to process. Please try again.",
        );
    }

    tracing::error!(error = %err, "Unhandled service error");
    ErrorResponse::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error. Please try again later.",
    )
}
