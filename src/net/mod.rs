//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! [server.tls] certificate + key (PEM)
//!     → tls.rs (rustls ServerConfig, TLS 1.3 or 1.2+)
//!     → axum-server TLS listener (http::server)
//! ```

pub mod tls;

pub use tls::{load_tls_config, TlsError};
