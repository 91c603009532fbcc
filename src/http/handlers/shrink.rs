//! The shrink endpoint.
//!
//! # Data Flow
//! ```text
//! request
//!     → declared Content-Length check (413)
//!     → params.rs (400 on bad parameters)
//!     → source: fetcher (url=...) or multipart field `input`
//!     → optimizer on the blocking pool: open (415/500) → resize | optimize (500)
//!     → octet/stream attachment
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::fetch::filename::sanitize;
use crate::http::handlers::params::{parse_params, ShrinkParams};
use crate::http::response::ErrorResponse;
use crate::http::server::AppState;
use crate::meta;
use crate::observability::metrics;
use crate::optimizer::{OptimizeError, Optimizer};

/// Multipart field holding the upload.
pub const INPUT_FIELD: &str = "input";

/// Media type of a successful response.
pub const OCTET_STREAM: &str = "octet/stream";

/// Image bytes and the name they go back under.
struct Source {
    data: Bytes,
    filename: String,
}

/// Handle `/v1/shrink`.
pub async fn shrink(State(state): State<AppState>, request: Request) -> Response {
    let start = Instant::now();

    let response = match dispatch(&state, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    metrics::record_request(meta::SHRINK, response.status().as_u16(), start);
    response
}

async fn dispatch(state: &AppState, request: Request) -> Result<Response, ErrorResponse> {
    let service = &state.config.service;
    let max_bytes = state.config.max_upload_bytes();

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > max_bytes as u64) {
        return Err(ErrorResponse::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "The image you uploaded is too large. The maximum upload size is {} MB. Please try again.",
                service.max_upload_size
            ),
        ));
    }

    let params = parse_params(request.uri().query(), service)?;

    let source = match params.url.as_deref() {
        Some(uri) => remote_source(state, uri).await?,
        None => upload_source(request).await?,
    };

    tracing::debug!(
        filename = %source.filename,
        bytes = source.data.len(),
        resize = params.resize(),
        "Shrinking image"
    );

    let optimized = run_optimizer(state.optimizer.clone(), source.data, params).await?;

    Ok(attachment(optimized, &source.filename))
}

async fn remote_source(state: &AppState, uri: &str) -> Result<Source, ErrorResponse> {
    let max_upload_size = state.config.service.max_upload_size;
    let too_large = || {
        ErrorResponse::bad_request(format!(
            "The image size cannot be greater than {max_upload_size} MB. Please provide a valid image and try again."
        ))
    };

    let fetched = state.fetcher.remote(uri).await.map_err(|e| {
        if e.is_too_large() {
            tracing::warn!(url = uri, error = %e, "Remote image is too large");
            return too_large();
        }
        tracing::error!(url = uri, error = %e, "Failed to fetch remote image");
        ErrorResponse::bad_request(
            "Cannot fetch the remote image. Please provide a valid image and try again.",
        )
    })?;

    if fetched.data.len() > state.config.max_upload_bytes() {
        tracing::warn!(url = uri, bytes = fetched.data.len(), "Remote image is too large");
        return Err(too_large());
    }

    Ok(Source {
        data: fetched.data,
        filename: fetched.filename,
    })
}

/// Read the `input` field of a multipart body. The route's body limit caps
/// how much of it is read.
async fn upload_source(request: Request) -> Result<Source, ErrorResponse> {
    let invalid = || {
        ErrorResponse::bad_request("Cannot process the image. Please provide a valid image and try again.")
    };

    let mut multipart = Multipart::from_request(request, &()).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to parse multipart form");
        invalid()
    })?;

    loop {
        let field = multipart.next_field().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read multipart form");
            invalid()
        })?;

        let Some(field) = field else {
            tracing::warn!(field = INPUT_FIELD, "Multipart form has no input file");
            return Err(invalid());
        };

        if field.name() != Some(INPUT_FIELD) {
            continue;
        }

        let filename = field.file_name().map(sanitize).unwrap_or_default();
        let data = field.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read input file");
            invalid()
        })?;

        return Ok(Source { data, filename });
    }
}

async fn run_optimizer(
    optimizer: Arc<dyn Optimizer>,
    data: Bytes,
    params: ShrinkParams,
) -> Result<Vec<u8>, ErrorResponse> {
    enum Stage {
        Open,
        Process,
    }

    let task = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, (Stage, OptimizeError)> {
        let mut image = optimizer.open(data).map_err(|e| (Stage::Open, e))?;

        let result = if params.resize() {
            image.resize(params.width, params.height, &params.options)
        } else {
            image.optimize(&params.options)
        };
        result.map_err(|e| (Stage::Process, e))
    });

    match task.await {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err((Stage::Open, OptimizeError::UnsupportedFormat))) => {
            tracing::warn!("Unsupported image format");
            Err(ErrorResponse::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported image format. Please provide a valid JPEG or PNG image and try again.",
            ))
        }
        Ok(Err((Stage::Open, e))) => {
            tracing::error!(error = %e, "Failed to open image");
            Err(ErrorResponse::internal())
        }
        Ok(Err((Stage::Process, e))) => {
            tracing::error!(error = %e, "Failed to shrink image");
            Err(ErrorResponse::internal())
        }
        Err(e) => {
            tracing::error!(error = %e, "Optimizer task failed");
            Err(ErrorResponse::internal())
        }
    }
}

fn attachment(data: Vec<u8>, filename: &str) -> Response {
    let disposition = HeaderValue::from_bytes(format!("attachment; filename={filename}").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(data),
    )
        .into_response()
}
