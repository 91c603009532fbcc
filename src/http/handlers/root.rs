//! Unprotected endpoints: the root redirect and the 404 fallback.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::http::response::ErrorResponse;
use crate::http::server::AppState;

/// Permanent redirect to the service homepage.
pub async fn root(State(state): State<AppState>) -> Response {
    match HeaderValue::from_str(&state.config.service.homepage) {
        Ok(location) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Homepage is not a valid Location header");
            ErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error. Please try again later.",
            )
            .into_response()
        }
    }
}

/// Any path without a route.
pub async fn not_found() -> ErrorResponse {
    ErrorResponse::new(
        StatusCode::NOT_FOUND,
        "Page not found. Please check the URL and try again.",
    )
}
