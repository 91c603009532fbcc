//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (request ID, tracing, timeout)
//!     → `/`          → handlers/root.rs (redirect or 404)
//!     → `/v1/*`      → middleware/ (recovery, user agent, API key, methods, legal headers)
//!                    → handlers/ping.rs | handlers/shrink.rs
//!     → response.rs (JSON envelope for every failure)
//! ```

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use middleware::{Chain, Link};
pub use response::ErrorResponse;
pub use server::{build_router, AppState, HttpServer, ServerError};
