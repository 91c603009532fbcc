//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::meta;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Listener configuration (bind address, TLS).
    pub server: ServerConfig,

    /// Service identity, credentials and request limits.
    pub service: ServiceConfig,

    /// Remote fetcher settings.
    pub fetch: FetchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Maximum upload size in bytes, saturating at `usize::MAX`.
    pub fn max_upload_bytes(&self) -> usize {
        usize::try_from(self.service.max_upload_size)
            .unwrap_or(usize::MAX)
            .saturating_mul(1 << 20)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:1997").
    pub address: String,

    /// TLS material for the listener.
    pub tls: TlsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0:1997".to_string(),
            tls: TlsConfig::default(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate chain (PEM).
    pub certificate: String,

    /// Path to private key (PEM).
    pub key: String,

    /// Minimum protocol version, "1.2" or "1.3".
    pub version: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            certificate: String::new(),
            key: String::new(),
            version: "1.3".to_string(),
        }
    }
}

/// Service identity and request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name reported in the outbound user agent.
    pub name: String,

    /// Where `/` redirects to.
    pub homepage: String,

    /// Contact address reported in the outbound user agent.
    pub contact: String,

    /// URI sent in the `Privacy-Policy` response header.
    pub privacy_policy: String,

    /// URI sent in the `Terms-Of-Service` response header.
    pub terms_of_service: String,

    /// API key clients present as `Authorization: Bearer <key>`.
    pub api_key: String,

    /// Maximum upload size in megabytes.
    pub max_upload_size: u64,

    /// Maximum `width` query parameter.
    pub max_allowed_width: u32,

    /// Maximum `height` query parameter.
    pub max_allowed_height: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: meta::NAME.to_string(),
            homepage: meta::HOMEPAGE.to_string(),
            contact: String::new(),
            privacy_policy: String::new(),
            terms_of_service: String::new(),
            api_key: String::new(),
            max_upload_size: 50,
            max_allowed_width: 10_000,
            max_allowed_height: 10_000,
        }
    }
}

/// Remote fetcher configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Sustained outbound request rate shared by the whole process.
    pub requests_per_second: f64,

    /// Token bucket capacity.
    pub burst: u32,

    /// Number of pages kept in the response cache.
    pub cache_capacity: usize,

    /// Seconds a cached page stays fresh.
    pub cache_ttl_secs: u64,

    /// Per-attempt request timeout in seconds.
    pub timeout_secs: u64,

    /// Retry policy for transient failures.
    pub retries: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2.0,
            burst: 1,
            cache_capacity: 1000,
            cache_ttl_secs: 3600,
            timeout_secs: 30,
            retries: RetryConfig::default(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Timeout configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for in-flight requests after a shutdown signal, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            shutdown_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
