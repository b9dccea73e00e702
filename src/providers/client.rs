//! Provider fetch: one GET, one parse, no retries

use super::traits::Provider;
use crate::error::{Result, SearchError};
use crate::network::HttpClient;
use crate::results::{SearchResult, Source};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// A provider bound to an HTTP client and a hard timeout.
///
/// Every failure path (request build, transport, timeout, status, parse)
/// comes back as [`SearchError::ProviderUnavailable`].
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn Provider>,
    client: HttpClient,
    timeout: Duration,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn Provider>, client: HttpClient) -> Self {
        let timeout = client.default_timeout();
        Self {
            provider,
            client,
            timeout,
        }
    }

    /// Override the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn source(&self) -> Source {
        self.provider.source()
    }

    /// Fetch up to `max_results` results for `query`
    pub async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        let name = self.provider.name();
        let start = Instant::now();

        let request = self
            .provider
            .request(query, max_results)
            .map_err(|e| SearchError::provider(name, e))?;

        let response = match timeout(self.timeout, self.client.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(SearchError::provider(name, e)),
            Err(_) => {
                return Err(SearchError::provider(
                    name,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        };

        let results = self
            .provider
            .response(response, max_results)
            .map_err(|e| SearchError::provider(name, e))?;

        debug!(
            "Provider {} returned {} results in {:?}",
            name,
            results.len(),
            start.elapsed()
        );

        Ok(results)
    }
}
