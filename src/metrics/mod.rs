//! Metrics collection module
//!
//! Tracks cache effectiveness and per-provider outcomes.

use crate::results::Source;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one provider slot
#[derive(Debug, Default)]
struct ProviderCounters {
    successes: AtomicU64,
    failures: AtomicU64,
    last_response_ms: AtomicU64,
}

impl ProviderCounters {
    fn snapshot(&self) -> ProviderStats {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let total = successes + failures;

        ProviderStats {
            successes,
            failures,
            last_response_ms: self.last_response_ms.load(Ordering::Relaxed),
            reliability: if total == 0 {
                100.0
            } else {
                (successes as f64 / total as f64) * 100.0
            },
        }
    }
}

/// Search metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    total_searches: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    exhausted: AtomicU64,
    primary: ProviderCounters,
    fallback: ProviderCounters,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn provider(&self, source: Source) -> &ProviderCounters {
        match source {
            Source::Primary => &self.primary,
            Source::Fallback => &self.fallback,
        }
    }

    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Both providers failed for one search
    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, source: Source, time_ms: u64) {
        let counters = self.provider(source);
        counters.successes.fetch_add(1, Ordering::Relaxed);
        counters.last_response_ms.store(time_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self, source: Source) {
        self.provider(source).failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_searches: self.total_searches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            primary: self.primary.snapshot(),
            fallback: self.fallback.snapshot(),
        }
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub exhausted: u64,
    pub primary: ProviderStats,
    pub fallback: ProviderStats,
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub successes: u64,
    pub failures: u64,
    pub last_response_ms: u64,
    pub reliability: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_cache_miss();
        metrics.record_failure(Source::Primary);
        metrics.record_success(Source::Fallback, 120);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_searches, 1);
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.primary.reliability, 0.0);
        assert_eq!(snap.fallback.reliability, 100.0);
        assert_eq!(snap.fallback.last_response_ms, 120);
    }
}
