//! Retry classification for outbound fetches.
//!
//! Server errors and throttling are transient; any other status is final.
//! Connection failures and timeouts are transient, everything else the
//! transport reports is not.

use reqwest::StatusCode;

/// Whether a response status is worth another attempt.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
