//! Error types for websearch-rs
//!
//! None of these ever reach a caller of [`crate::Search::search`]; the
//! orchestrator recovers from all of them and degrades to fewer results.

/// Errors raised inside the search pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A single provider failed: transport error, timeout, non-2xx status,
    /// bot-check page or parse failure.
    #[error("provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// Every configured provider failed for this query.
    #[error("all providers exhausted")]
    AllProvidersExhausted,

    /// The cache backend could not be read or written.
    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),
}

impl SearchError {
    pub fn provider(provider: impl Into<String>, reason: impl ToString) -> Self {
        SearchError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.to_string(),
        }
    }

    pub fn cache(reason: impl ToString) -> Self {
        SearchError::CacheUnavailable(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
