//! Remote image fetcher.
//!
//! # Data Flow
//! ```text
//! remote(url)
//!     → parse URL, require https (no I/O before this passes)
//!     → cache.rs lookup (normalized URL)
//!     → on miss: rate limiter → transport.rs → retry transient failures
//!     → require 200, populate cache
//!     → filename.rs (Content-Disposition, else URL path)
//! ```
//!
//! The cache and rate limiter are process-wide. They are built once by the
//! server and handed to the fetcher, never reached through globals.

pub mod cache;
pub mod filename;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::config::{Config, RetryConfig};
use crate::meta;
use crate::observability::metrics;
use crate::resilience::{backoff_for, is_retryable_status, RateLimiter};

pub use cache::PageCache;
pub use filename::extract_filename;
pub use transport::{HttpTransport, RemoteResponse, Transport, TransportError};

/// Bytes of a fetched image and the name it should be served under.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub data: Bytes,
    pub filename: String,
}

/// Reasons a remote fetch fails.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch data: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid protocol; must be https: {0}")]
    InvalidProtocol(String),
    #[error("failed to fetch data: {0}")]
    Status(String),
    #[error("failed to fetch data: {0}")]
    Transport(#[from] TransportError),
}

impl FetchError {
    /// The remote body crossed the configured size ceiling.
    pub fn is_too_large(&self) -> bool {
        matches!(self, FetchError::Transport(TransportError::TooLarge { .. }))
    }

    fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::InvalidProtocol(_) => "invalid_protocol",
            FetchError::Status(_) => "status",
            FetchError::Transport(TransportError::TooLarge { .. }) => "too_large",
            FetchError::Transport(_) => "transport",
        }
    }
}

/// Outbound user agent: `<name>/<version> (<contact>)`.
pub fn user_agent(name: &str, contact: &str) -> String {
    format!("{name}/{} ({contact})", meta::VERSION)
}

/// Rate-limited, cached, retrying HTTPS client for user-supplied image URLs.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<PageCache>,
    limiter: Arc<RateLimiter>,
    retry: RetryConfig,
}

impl Fetcher {
    /// Assemble a fetcher from its shared parts.
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<PageCache>,
        limiter: Arc<RateLimiter>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            transport,
            cache,
            limiter,
            retry,
        }
    }

    /// Build the production fetcher described by the configuration.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let fetch = &config.fetch;
        let transport = HttpTransport::new(
            &user_agent(&config.service.name, &config.service.contact),
            Duration::from_secs(fetch.timeout_secs),
            config.max_upload_bytes(),
        )?;

        Ok(Self::new(
            Arc::new(transport),
            Arc::new(PageCache::new(
                fetch.cache_capacity,
                Duration::from_secs(fetch.cache_ttl_secs),
            )),
            Arc::new(RateLimiter::new(fetch.requests_per_second, fetch.burst)),
            fetch.retries.clone(),
        ))
    }

    /// The shared page cache.
    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// Fetch an image by URL.
    pub async fn remote(&self, uri: &str) -> Result<FetchResult, FetchError> {
        let result = self.fetch(uri).await;
        match &result {
            Ok(_) => metrics::record_fetch("ok"),
            Err(e) => metrics::record_fetch(e.kind()),
        }
        result
    }

    async fn fetch(&self, uri: &str) -> Result<FetchResult, FetchError> {
        let url = Url::parse(uri)?;
        if url.scheme() != "https" {
            return Err(FetchError::InvalidProtocol(url.scheme().to_string()));
        }

        let key = PageCache::key(&url);
        let response = match self.cache.get(&key) {
            Some(response) => {
                tracing::debug!(url = %key, "Fetch cache hit");
                response
            }
            None => {
                let response = self.fetch_with_retries(&url).await?;
                if response.status == StatusCode::OK {
                    self.cache.insert(key, response.clone());
                }
                response
            }
        };

        if response.status != StatusCode::OK {
            return Err(FetchError::Status(response.status.to_string()));
        }

        let filename = extract_filename(response.content_disposition.as_deref(), &response.url);

        Ok(FetchResult {
            data: response.body,
            filename,
        })
    }

    async fn fetch_with_retries(&self, url: &Url) -> Result<RemoteResponse, FetchError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;
            self.limiter.acquire().await;

            match self.transport.get(url).await {
                Ok(response) if attempts < max_attempts && is_retryable_status(response.status) => {
                    let delay = backoff_for(&self.retry, attempts);
                    tracing::info!(url = %url, attempt = attempts, delay = ?delay, status = %response.status, "Retrying fetch");
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(e) if attempts < max_attempts && e.is_retryable() => {
                    let delay = backoff_for(&self.retry, attempts);
                    tracing::info!(url = %url, attempt = attempts, delay = ?delay, error = %e, "Retrying fetch after transport error");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
