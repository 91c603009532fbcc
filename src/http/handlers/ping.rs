use axum::{http::header, response::IntoResponse};

/// Body of a ping response.
pub const PONG: &str = "pong";

/// Liveness check.
pub async fn ping() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], PONG)
}
