//! Service identity and endpoint paths.

/// Name of the service, used when the configuration does not override it.
pub const NAME: &str = "Shrink Images";

/// Public homepage of the service.
pub const HOMEPAGE: &str = "https://shrinkimages.com";

/// Crate version, reported in the outbound user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current version of the HTTP API.
pub const API_VERSION: &str = "v1";

/// Endpoint for the root handler.
pub const ROOT: &str = "/";

/// Endpoint for the liveness check.
pub const PING: &str = "/v1/ping";

/// Endpoint for image optimization.
pub const SHRINK: &str = "/v1/shrink";
