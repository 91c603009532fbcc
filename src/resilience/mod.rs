//! Resilience subsystem for outbound fetches.
//!
//! # Data Flow
//! ```text
//! Remote fetch:
//!     → rate_limit.rs (wait for a token from the shared bucket)
//!     → transport call
//!     → On failure: retries.rs (transient?) + backoff.rs (how long to wait)
//! ```
//!
//! Only transient failures are retried, with a bounded number of attempts.

pub mod backoff;
pub mod rate_limit;
pub mod retries;

pub use backoff::{backoff_for, calculate_backoff};
pub use rate_limit::RateLimiter;
pub use retries::is_retryable_status;
