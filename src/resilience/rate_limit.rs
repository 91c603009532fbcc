//! Token bucket rate limiter for outbound requests.
//!
//! One limiter is shared by every fetch in the process. Callers wait for a
//! token instead of being rejected. The lock is only held to refill and take
//! a token, never across the sleep, so dropping a waiting future (client gone,
//! request timed out) leaves the bucket untouched.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::observability::metrics;

/// A simple token bucket.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take a token, or report how long until one is available.
    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            Err(Duration::from_secs_f64((1.0 - self.tokens) / refill_rate))
        }
    }
}

/// Process-wide limiter for remote fetches.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    rate: f64,
    burst: f64,
}

impl RateLimiter {
    /// Create a limiter allowing `rate` requests per second with `burst` capacity.
    pub fn new(rate: f64, burst: u32) -> Self {
        let burst = f64::from(burst.max(1));
        Self {
            bucket: Mutex::new(TokenBucket::new(burst)),
            rate,
            burst,
        }
    }

    /// Take a token without waiting.
    pub fn try_acquire(&self) -> bool {
        self.check().is_ok()
    }

    /// Wait until a token is available and take it.
    pub async fn acquire(&self) {
        let mut waited = false;
        while let Err(wait) = self.check() {
            if !waited {
                metrics::record_rate_limited();
                waited = true;
            }
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Waiting for fetch rate limit");
            tokio::time::sleep(wait).await;
        }
    }

    fn check(&self) -> Result<(), Duration> {
        let mut bucket = self.bucket.lock().unwrap_or_else(|e| e.into_inner());
        bucket.try_acquire(self.burst, self.rate)
    }
}
