//! Caching module for websearch-rs
//!
//! [`ResultCache`] maps a normalised query to the result set last fetched
//! for it. Expiry is enforced lazily: a read that finds an expired entry
//! deletes it and reports a miss. Storage itself is behind [`CacheStore`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::{Result, SearchError};
use crate::results::SearchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default lifetime of a cached result set
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// One cached result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub normalized_query: String,
    pub results: Vec<SearchResult>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// An entry is expired from `expires_at` onwards
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Derive the cache identity of a raw query
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Key-value storage for cache entries.
///
/// Stores hold no expiry policy. `store` must replace the whole entry
/// atomically.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>>;

    async fn store(&self, entry: CacheEntry) -> Result<()>;

    /// Atomically delete the entry for `key` if its `expires_at` is no
    /// later than `stale_at`. An entry refreshed since it was read stays.
    async fn remove_stale(&self, key: &str, stale_at: DateTime<Utc>) -> Result<()>;
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cache for search results, sole owner of entry storage
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CacheStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// In-process cache backed by [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Get a live entry. An expired entry is deleted and reported as absent.
    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entry = match self.store.load(key).await? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        if entry.is_expired(self.clock.now()) {
            debug!("Cache entry for '{}' expired at {}", key, entry.expires_at);
            self.store.remove_stale(key, entry.expires_at).await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Create or fully replace the entry for `key`
    pub async fn put(&self, key: &str, results: Vec<SearchResult>, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl).map_err(SearchError::cache)?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| SearchError::cache("ttl overflows the calendar"))?;

        self.store
            .store(CacheEntry {
                normalized_query: key.to_string(),
                results,
                expires_at,
            })
            .await
    }
}
