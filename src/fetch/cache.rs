//! In-memory page cache for remote fetches.
//!
//! Keyed by the normalized request URL, bounded by entry count (LRU) and by
//! age. The lock is never held across an await point. Two requests racing on
//! the same missing URL may both fetch and both insert; the second insert
//! simply replaces the first with an equivalent page.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;
use url::Url;

use super::transport::RemoteResponse;
use crate::observability::metrics;

struct CachedPage {
    response: RemoteResponse,
    stored_at: Instant,
}

/// Thread-safe LRU cache of successful responses.
pub struct PageCache {
    entries: Mutex<LruCache<String, CachedPage>>,
    ttl: Duration,
}

impl PageCache {
    /// Create a cache holding at most `capacity` pages for at most `ttl`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    /// Cache key for a URL: its serialization without the fragment.
    pub fn key(url: &Url) -> String {
        let mut url = url.clone();
        url.set_fragment(None);
        url.into()
    }

    /// Look up a fresh page, dropping it if it has expired.
    pub fn get(&self, key: &str) -> Option<RemoteResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let lookup = entries
            .get(key)
            .map(|page| (page.stored_at.elapsed() < self.ttl, page.response.clone()));

        let fresh = match lookup {
            Some((true, response)) => Some(response),
            Some((false, _)) => {
                entries.pop(key);
                tracing::trace!(key, "Expired page evicted from fetch cache");
                None
            }
            None => None,
        };

        metrics::record_cache_lookup(fresh.is_some());
        fresh
    }

    /// Store a page, evicting the least recently used one when full.
    pub fn insert(&self, key: String, response: RemoteResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        tracing::debug!(key = %key, bytes = response.body.len(), "Storing page in fetch cache");
        entries.put(
            key,
            CachedPage {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of cached pages, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
