//! Shrink Images: an HTTPS gateway that re-encodes JPEG and PNG images.

pub mod config;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod meta;
pub mod net;
pub mod observability;
pub mod optimizer;
pub mod resilience;
pub mod security;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
