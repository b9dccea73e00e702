//! Provider traits and types

use crate::results::{SearchResult, Source};
use std::collections::HashMap;

/// HTTP GET to be issued for a provider search
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Fully built URL, query already percent-encoded
    pub url: String,
    /// Provider-specific headers, sent after the client defaults
    pub headers: HashMap<String, String>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the page carries bot-check markers. Result text can mention
    /// these too, so providers confirm before treating the page as blocked.
    pub fn is_captcha(&self) -> bool {
        self.text.contains("captcha")
            || self.text.contains("CAPTCHA")
            || self.text.contains("unusual traffic")
            || self.text.contains("automated requests")
    }
}

/// A search provider: request shaping plus HTML extraction rules.
///
/// Implementations are pure; [`super::ProviderClient`] performs the I/O
/// and turns any error into `ProviderUnavailable`.
pub trait Provider: Send + Sync {
    /// Provider name, used in logs and errors
    fn name(&self) -> &str;

    /// Which slot this provider fills; stamped on every result it yields
    fn source(&self) -> Source;

    /// Build the HTTP request for a search
    fn request(&self, query: &str, max_results: usize) -> anyhow::Result<ProviderRequest>;

    /// Parse the HTTP response into at most `max_results` results.
    ///
    /// A page with no qualifying blocks is `Ok(vec![])`, not an error.
    fn response(
        &self,
        response: ProviderResponse,
        max_results: usize,
    ) -> anyhow::Result<Vec<SearchResult>>;
}
