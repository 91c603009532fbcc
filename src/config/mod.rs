//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! Config is read once at startup and never changes for the lifetime of the
//! process. All fields have defaults so minimal files stay short.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    Config, FetchConfig, ObservabilityConfig, RetryConfig, ServerConfig, ServiceConfig,
    TimeoutConfig, TlsConfig,
};
pub use validation::{validate_config, ValidationError};
