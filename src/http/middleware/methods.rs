//! Method allow-list.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ErrorResponse;

/// Accepted methods and the matching `Allow` value.
#[derive(Debug, Clone)]
pub struct AllowedMethods {
    methods: Vec<Method>,
    allow: HeaderValue,
}

impl AllowedMethods {
    pub fn new(methods: Vec<Method>) -> Self {
        let list = methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        // Method names are tokens, always valid header text.
        let allow = HeaderValue::from_str(&list).unwrap_or_else(|_| HeaderValue::from_static(""));
        Self { methods, allow }
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn allow(&self) -> &HeaderValue {
        &self.allow
    }
}

/// 405 with `Allow` for any method outside the list.
pub async fn accept_methods(
    State(allowed): State<Arc<AllowedMethods>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if allowed.contains(req.method()) {
        return next.run(req).await;
    }

    tracing::debug!(method = %req.method(), path = %req.uri().path(), "Method not allowed");

    let mut response = ErrorResponse::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("Method {} not allowed.", req.method()),
    )
    .into_response();
    response
        .headers_mut()
        .insert(header::ALLOW, allowed.allow().clone());
    response
}
