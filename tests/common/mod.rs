//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use url::Url;

use shrinkimages::config::{Config, RetryConfig};
use shrinkimages::fetch::{Fetcher, PageCache, RemoteResponse, Transport, TransportError};
use shrinkimages::http::{build_router, AppState};
use shrinkimages::optimizer::{ImageHandle, OptimizationOptions, OptimizeError, Optimizer};
use shrinkimages::resilience::RateLimiter;

pub const API_KEY: &str = "shrink-c2hyaW5rLWltYWdlcy1pbnRlZ3JhdGlvbi10ZXN0";
pub const BOUNDARY: &str = "shrinkimagesboundary";
pub const USER_AGENT: &str = "shrinkimages-tests/1.0";

/// A validated configuration with a 1 MB upload limit.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.tls.certificate = "/nonexistent/cert.pem".into();
    config.server.tls.key = "/nonexistent/key.pem".into();
    config.service.contact = "ops@example.com".into();
    config.service.privacy_policy = "https://example.com/privacy".into();
    config.service.terms_of_service = "https://example.com/terms".into();
    config.service.api_key = API_KEY.into();
    config.service.max_upload_size = 1;
    config
}

/// What the mock optimizer does when asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Unsupported,
    BrokenDecode,
    BrokenEncode,
    Panic,
}

/// Everything the mock optimizer saw.
#[derive(Default)]
pub struct Calls {
    pub opened: Mutex<Vec<Bytes>>,
    pub optimized: Mutex<Vec<OptimizationOptions>>,
    pub resized: Mutex<Vec<(u32, u32, OptimizationOptions)>>,
    pub released: AtomicUsize,
}

impl Calls {
    pub fn opened(&self) -> Vec<Bytes> {
        self.opened.lock().unwrap().clone()
    }

    pub fn optimized(&self) -> Vec<OptimizationOptions> {
        self.optimized.lock().unwrap().clone()
    }

    pub fn resized(&self) -> Vec<(u32, u32, OptimizationOptions)> {
        self.resized.lock().unwrap().clone()
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

pub struct MockOptimizer {
    pub calls: Arc<Calls>,
    behavior: Behavior,
}

impl MockOptimizer {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            calls: Arc::new(Calls::default()),
            behavior,
        })
    }
}

impl Optimizer for MockOptimizer {
    fn open(&self, data: Bytes) -> Result<Box<dyn ImageHandle>, OptimizeError> {
        self.calls.opened.lock().unwrap().push(data.clone());

        match self.behavior {
            Behavior::Unsupported => Err(OptimizeError::UnsupportedFormat),
            Behavior::BrokenDecode => Err(OptimizeError::Decode("corrupt".into())),
            Behavior::Panic => panic!("optimizer exploded"),
            Behavior::Succeed | Behavior::BrokenEncode => Ok(Box::new(MockHandle {
                calls: self.calls.clone(),
                data,
                fail: self.behavior == Behavior::BrokenEncode,
            })),
        }
    }
}

struct MockHandle {
    calls: Arc<Calls>,
    data: Bytes,
    fail: bool,
}

impl MockHandle {
    fn output(&self) -> Result<Vec<u8>, OptimizeError> {
        if self.fail {
            return Err(OptimizeError::Encode("encoder failed".into()));
        }
        Ok([b"optimized:".as_slice(), &self.data].concat())
    }
}

impl ImageHandle for MockHandle {
    fn optimize(&mut self, options: &OptimizationOptions) -> Result<Vec<u8>, OptimizeError> {
        self.calls.optimized.lock().unwrap().push(options.clone());
        self.output()
    }

    fn resize(
        &mut self,
        width: u32,
        height: u32,
        options: &OptimizationOptions,
    ) -> Result<Vec<u8>, OptimizeError> {
        self.calls
            .resized
            .lock()
            .unwrap()
            .push((width, height, options.clone()));
        self.output()
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.calls.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Transport serving one fixed image for every URL.
pub struct MockTransport {
    pub calls: AtomicUsize,
    body: Bytes,
    delay: Duration,
}

impl MockTransport {
    pub fn new(body: impl Into<Bytes>) -> Arc<Self> {
        Self::with_delay(body, Duration::ZERO)
    }

    pub fn with_delay(body: impl Into<Bytes>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            body: body.into(),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<RemoteResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(RemoteResponse {
            status: StatusCode::OK,
            content_disposition: Some("attachment; filename=\"remote.png\"".into()),
            url: url.clone(),
            body: self.body.clone(),
        })
    }
}

/// Fetcher over a mock transport with a generous rate limit and no retries.
pub fn fetcher(transport: Arc<MockTransport>) -> Fetcher {
    Fetcher::new(
        transport,
        Arc::new(PageCache::new(16, Duration::from_secs(60))),
        Arc::new(RateLimiter::new(1000.0, 100)),
        RetryConfig {
            max_attempts: 1,
            base_delay_ms: 1,
            max_delay_ms: 1,
        },
    )
}

/// Router over the mocks with the test configuration.
pub fn app(optimizer: Arc<MockOptimizer>, transport: Arc<MockTransport>) -> Router {
    app_with(test_config(), optimizer, transport)
}

/// Router over the mocks with a custom configuration.
pub fn app_with(
    config: Config,
    optimizer: Arc<MockOptimizer>,
    transport: Arc<MockTransport>,
) -> Router {
    build_router(AppState {
        config: Arc::new(config),
        fetcher: fetcher(transport),
        optimizer,
    })
    .unwrap()
}

/// A multipart body with one file field.
pub fn multipart(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Authenticated request builder.
pub fn authorized(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, USER_AGENT)
        .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
}

/// Authenticated multipart upload to the shrink endpoint.
pub fn upload(query: &str, body: Vec<u8>) -> Request<Body> {
    let uri = if query.is_empty() {
        "/v1/shrink".to_string()
    } else {
        format!("/v1/shrink?{query}")
    };

    authorized(Method::POST, &uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub async fn json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
