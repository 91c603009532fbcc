//! Startup orchestration.
//!
//! Load and validate configuration, then logging, then metrics, then the
//! server. Any startup error is fatal and is returned to the binary.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{load_config, Config, ConfigError};
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::meta;
use crate::observability::{logging, metrics};
use crate::optimizer::ImageEngine;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Load `path` and serve until a shutdown signal arrives.
pub async fn start(path: &Path) -> Result<(), StartupError> {
    let config = load_config(path)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        version = meta::VERSION,
        config = %path.display(),
        "{} starting",
        meta::NAME
    );

    serve(config, &Shutdown::new()).await
}

/// Run a validated configuration with the default image engine.
pub async fn serve(config: Config, shutdown: &Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        address = %config.server.address,
        max_upload_size_mb = config.service.max_upload_size,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let server = HttpServer::new(config, Arc::new(ImageEngine))?;
    server.run(shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
