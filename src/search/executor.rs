//! Search execution: cache-aside lookup with provider fallback

use crate::cache::{
    normalize_query, CacheStore, MemoryStore, ResultCache, SqliteStore, DEFAULT_TTL,
};
use crate::config::{CacheBackend, Settings};
use crate::error::{Result, SearchError};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{DuckDuckGo, Google, Provider, ProviderClient};
use crate::results::SearchResult;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Search entry point.
///
/// Consults the cache, falls through the providers in priority order on a
/// miss, and writes whatever the first successful provider returned back
/// to the cache before returning it. Never fails: when every provider is
/// down the result is simply empty.
pub struct Search {
    cache: ResultCache,
    /// Priority order; the first success wins
    providers: Vec<ProviderClient>,
    ttl: Duration,
    metrics: Arc<Metrics>,
}

impl Search {
    /// Create a new search over `providers`, tried in the given order
    pub fn new(providers: Vec<ProviderClient>, cache: ResultCache) -> Self {
        Self {
            cache,
            providers,
            ttl: DEFAULT_TTL,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Set the lifetime of freshly cached result sets
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Build providers, cache backend and TTL from configuration
    pub async fn from_settings(settings: &Settings, client: HttpClient) -> anyhow::Result<Self> {
        let mut providers = Vec::new();

        let primary = &settings.providers.primary;
        if !primary.disabled {
            let google = match primary.base_url {
                Some(ref url) => Google::with_base_url(url)?,
                None => Google::new()?,
            };
            providers.push(Self::provider_client(google, &client));
        }

        let fallback = &settings.providers.fallback;
        if !fallback.disabled {
            let ddg = match fallback.base_url {
                Some(ref url) => DuckDuckGo::with_base_url(url)?,
                None => DuckDuckGo::new()?,
            };
            providers.push(Self::provider_client(ddg, &client));
        }

        let store: Arc<dyn CacheStore> = match (settings.cache.backend, &settings.cache.path) {
            (CacheBackend::Memory, _) => Arc::new(MemoryStore::new()),
            (CacheBackend::Sqlite, Some(path)) => Arc::new(SqliteStore::open(path).await?),
            (CacheBackend::Sqlite, None) => Arc::new(SqliteStore::open_in_memory().await?),
        };

        info!(
            "Search ready with {} providers, {:?} cache",
            providers.len(),
            settings.cache.backend
        );

        Ok(Self::new(providers, ResultCache::new(store))
            .with_ttl(Duration::from_secs(settings.cache.ttl_hours.saturating_mul(3600))))
    }

    fn provider_client(provider: impl Provider + 'static, client: &HttpClient) -> ProviderClient {
        ProviderClient::new(Arc::new(provider), client.clone())
    }

    /// Shared metrics for this search instance
    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    /// Search for `query`, returning at most `max_results` fresh results.
    ///
    /// A cache hit is returned exactly as stored; `max_results` only bounds
    /// a fresh fetch.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let max_results = max_results.max(1);
        let key = normalize_query(query);
        self.metrics.inc_search();

        match self.cache.get(&key).await {
            Ok(Some(entry)) => {
                debug!("Cache hit for '{}'", key);
                self.metrics.record_cache_hit();
                return entry.results;
            }
            Ok(None) => {
                debug!("Cache miss for '{}'", key);
            }
            Err(e) => {
                warn!("Cache read failed, treating as miss: {}", e);
            }
        }
        self.metrics.record_cache_miss();

        let results = match self.fetch_fresh(query, max_results).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Search degraded to no results: {}", e);
                return Vec::new();
            }
        };

        if let Err(e) = self.cache.put(&key, results.clone(), self.ttl).await {
            warn!("Cache write failed: {}", e);
        }

        results
    }

    /// Keyed variant of [`Search::search`]. The key is accepted for API
    /// compatibility and not sent anywhere.
    pub async fn search_with_api_key(
        &self,
        query: &str,
        max_results: usize,
        _api_key: &str,
    ) -> Vec<SearchResult> {
        self.search(query, max_results).await
    }

    async fn fetch_fresh(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        for (i, provider) in self.providers.iter().enumerate() {
            if i > 0 {
                info!("Falling back to provider {}", provider.name());
            }

            let start = Instant::now();
            match provider.fetch(query, max_results).await {
                Ok(results) => {
                    self.metrics
                        .record_success(provider.source(), start.elapsed().as_millis() as u64);
                    return Ok(results);
                }
                Err(e) => {
                    self.metrics.record_failure(provider.source());
                    warn!("{}", e);
                }
            }
        }

        self.metrics.record_exhausted();
        Err(SearchError::AllProvidersExhausted)
    }
}
