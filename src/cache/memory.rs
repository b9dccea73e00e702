//! In-process cache store

use super::{CacheEntry, CacheStore};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use moka::ops::compute::Op;

/// Memory-backed [`CacheStore`].
///
/// No capacity bound and no moka TTL: entries leave only through
/// [`super::ResultCache`]'s expiry check.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, CacheEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.cache.get(key).await)
    }

    async fn store(&self, entry: CacheEntry) -> Result<()> {
        self.cache.insert(entry.normalized_query.clone(), entry).await;
        Ok(())
    }

    async fn remove_stale(&self, key: &str, stale_at: DateTime<Utc>) -> Result<()> {
        let _ = self
            .cache
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let op = match current {
                    Some(entry) if entry.value().expires_at <= stale_at => Op::Remove,
                    _ => Op::Nop,
                };
                std::future::ready(op)
            })
            .await;
        Ok(())
    }
}
