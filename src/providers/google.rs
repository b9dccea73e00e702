//! Google search provider (primary)

use super::extract::{extract_results, has_blocks, normalize_href, query_value, BlockSelectors};
use super::traits::*;
use crate::results::{SearchResult, Source};
use anyhow::{anyhow, Result as AnyhowResult};
use url::Url;

const BASE_URL: &str = "https://www.google.com/search";

/// Google web search, scraped from the HTML results page
pub struct Google {
    base_url: Url,
    selectors: BlockSelectors,
}

impl Google {
    pub fn new() -> AnyhowResult<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Point the provider at a different endpoint
    pub fn with_base_url(base_url: &str) -> AnyhowResult<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            selectors: BlockSelectors::parse(
                "div.g",
                "h3",
                "a[href]",
                "div.VwiC3b, span.aCOpRe, div.IsZvec, div[data-sncf]",
            )?,
        })
    }

    /// Unwrap Google's `/url?q=<target>&sa=...` click-tracking links
    fn unwrap_redirect(url: &Url) -> Option<String> {
        if url.path() != "/url" {
            return None;
        }
        query_value(url, "q").or_else(|| query_value(url, "url"))
    }

    /// Bot checks are served from `/sorry/`. Failing that, a page is only
    /// blocked if it carries captcha markers and no result blocks at all.
    fn is_blocked(&self, response: &ProviderResponse) -> bool {
        if response.url.contains("/sorry/") {
            return true;
        }
        response.is_captcha() && !has_blocks(&response.text, &self.selectors)
    }
}

impl Provider for Google {
    fn name(&self) -> &str {
        "google"
    }

    fn source(&self) -> Source {
        Source::Primary
    }

    fn request(&self, query: &str, max_results: usize) -> AnyhowResult<ProviderRequest> {
        // Ask for a little more than needed; some blocks get skipped.
        let num = max_results.saturating_add(5).min(100);
        let url = format!(
            "{}?q={}&hl=en&num={}",
            self.base_url,
            urlencoding::encode(query),
            num
        );

        Ok(ProviderRequest::get(url))
    }

    fn response(
        &self,
        response: ProviderResponse,
        max_results: usize,
    ) -> AnyhowResult<Vec<SearchResult>> {
        if !response.is_success() {
            return Err(anyhow!("HTTP error: {}", response.status));
        }

        if self.is_blocked(&response) {
            return Err(anyhow!("CAPTCHA detected"));
        }

        Ok(extract_results(
            &response.text,
            &self.selectors,
            max_results,
            self.source(),
            |href| normalize_href(href, &self.base_url, Self::unwrap_redirect),
        ))
    }
}
