//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: `/` unprotected, `/v1/ping` and `/v1/shrink`
//!   behind the middleware chain
//! - Wire up ambient layers (request ID, tracing, request timeout)
//! - Serve over TLS with `axum-server`
//! - Graceful shutdown on signal or on [`Shutdown::trigger`]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::{DefaultBodyLimit, Request},
    http::header::InvalidHeaderValue,
    routing::any,
    Router,
};
use axum_server::Handle;
use thiserror::Error;
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::http::handlers::{not_found, ping, root, shrink};
use crate::http::middleware::{handle_timeout, Chain};
use crate::lifecycle::{wait_for_signal, Shutdown};
use crate::meta;
use crate::net::{load_tls_config, TlsError};
use crate::optimizer::Optimizer;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Errors that stop the server from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid server address {0}")]
    Address(String),
    #[error("invalid header value in service configuration: {0}")]
    Header(#[from] InvalidHeaderValue),
    #[error("failed to build fetch client: {0}")]
    Client(#[from] reqwest::Error),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub fetcher: Fetcher,
    pub optimizer: Arc<dyn Optimizer>,
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Result<Router, ServerError> {
    let config = state.config.clone();
    let chain = Chain::protected(&config.service)?;

    let protected = chain.apply(
        Router::new().route(meta::PING, any(ping)).route(
            meta::SHRINK,
            any(shrink).layer(DefaultBodyLimit::max(config.max_upload_bytes())),
        ),
    );

    Ok(Router::new()
        .route(meta::ROOT, any(root))
        .merge(protected)
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid)))
}

/// Request span carrying the ID assigned by `SetRequestIdLayer`.
fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id
    )
}

/// HTTPS server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<Config>,
}

impl HttpServer {
    /// Create a server with the production fetcher and the given optimizer.
    pub fn new(config: Config, optimizer: Arc<dyn Optimizer>) -> Result<Self, ServerError> {
        let fetcher = Fetcher::from_config(&config)?;
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            fetcher,
            optimizer,
        };

        let router = build_router(state)?;
        Ok(Self { router, config })
    }

    /// Serve until the listener fails or shutdown is requested.
    ///
    /// In-flight requests get `timeouts.shutdown_secs` to finish before their
    /// connections are closed.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), ServerError> {
        let server = &self.config.server;
        let addr: SocketAddr = server
            .address
            .parse()
            .map_err(|_| ServerError::Address(server.address.clone()))?;

        let tls = load_tls_config(
            Path::new(&server.tls.certificate),
            Path::new(&server.tls.key),
            &server.tls.version,
        )
        .await?;

        let handle = Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_secs);
        let mut requested = shutdown.subscribe();
        let watcher = handle.clone();
        let stopper = tokio::spawn(async move {
            tokio::select! {
                _ = requested.recv() => tracing::info!("Shutdown requested"),
                _ = wait_for_signal() => {}
            }
            watcher.graceful_shutdown(Some(grace));
        });

        tracing::info!(
            address = %addr,
            tls_version = %server.tls.version,
            "HTTP server starting"
        );

        let result = axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await;

        stopper.abort();
        result?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
