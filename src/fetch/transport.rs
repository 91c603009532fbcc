//! Outbound HTTP transport.
//!
//! The fetcher talks to the network through the [`Transport`] trait so that
//! caching, rate limiting and retries can be exercised without sockets.
//! [`HttpTransport`] is the production implementation on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// A complete response from a remote host.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    /// Response status.
    pub status: StatusCode,
    /// Raw `Content-Disposition` header, if the host sent one.
    pub content_disposition: Option<String>,
    /// URL the response was served from, after redirects.
    pub url: Url,
    /// Response body; empty for non-200 responses.
    pub body: Bytes,
}

/// Failures below the HTTP status level.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("response body exceeded the maximum of {limit} bytes")]
    TooLarge { limit: usize },
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and connection failures may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Something that can GET a URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<RemoteResponse, TransportError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpTransport {
    /// Build a transport that identifies itself with `user_agent`, gives up on
    /// an attempt after `timeout`, and never buffers more than `max_body_bytes`.
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .https_only(true)
            .build()?;

        Ok(Self {
            client,
            max_body_bytes,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<RemoteResponse, TransportError> {
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        let final_url = response.url().clone();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if status != StatusCode::OK {
            return Ok(RemoteResponse {
                status,
                content_disposition,
                url: final_url,
                body: Bytes::new(),
            });
        }

        let limit = self.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(TransportError::TooLarge { limit });
        }

        // Stream the body so an oversized image is dropped as soon as it
        // crosses the limit instead of after it has been fully buffered.
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(TransportError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(RemoteResponse {
            status,
            content_disposition,
            url: final_url,
            body: body.freeze(),
        })
    }
}
