//! DuckDuckGo search provider (fallback)
//!
//! Uses the JavaScript-free HTML endpoint, which tolerates automated
//! clients better than Google does.

use super::extract::{extract_results, normalize_href, query_value, BlockSelectors};
use super::traits::*;
use crate::results::{SearchResult, Source};
use anyhow::{anyhow, Result as AnyhowResult};
use url::Url;

const HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo web search, scraped from the HTML-only results page
pub struct DuckDuckGo {
    html_url: Url,
    selectors: BlockSelectors,
}

impl DuckDuckGo {
    pub fn new() -> AnyhowResult<Self> {
        Self::with_base_url(HTML_URL)
    }

    /// Point the provider at a different endpoint
    pub fn with_base_url(html_url: &str) -> AnyhowResult<Self> {
        Ok(Self {
            html_url: Url::parse(html_url)?,
            selectors: BlockSelectors::parse(
                "div.result",
                "a.result__a",
                "a.result__a",
                ".result__snippet",
            )?,
        })
    }

    /// Unwrap `//duckduckgo.com/l/?uddg=<target>&rut=...` links
    fn unwrap_redirect(url: &Url) -> Option<String> {
        if !url.path().starts_with("/l/") {
            return None;
        }
        query_value(url, "uddg")
    }
}

impl Provider for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn source(&self) -> Source {
        Source::Fallback
    }

    fn request(&self, query: &str, _max_results: usize) -> AnyhowResult<ProviderRequest> {
        let url = format!("{}?q={}&kl=us-en", self.html_url, urlencoding::encode(query));

        Ok(ProviderRequest::get(url).header("Referer", "https://html.duckduckgo.com/"))
    }

    fn response(
        &self,
        response: ProviderResponse,
        max_results: usize,
    ) -> AnyhowResult<Vec<SearchResult>> {
        if !response.is_success() {
            return Err(anyhow!("HTTP error: {}", response.status));
        }

        Ok(extract_results(
            &response.text,
            &self.selectors,
            max_results,
            self.source(),
            |href| normalize_href(href, &self.html_url, Self::unwrap_redirect),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(title: &str, href: &str, snippet: &str) -> String {
        format!(
            r#"<div class="result results_links web-result">
                 <h2 class="result__title"><a class="result__a" href="{}">{}</a></h2>
                 <a class="result__snippet" href="{}">{}</a>
               </div>"#,
            href, title, href, snippet
        )
    }

    fn page(blocks: &[String]) -> ProviderResponse {
        ProviderResponse {
            status: 200,
            text: format!("<html><body>{}</body></html>", blocks.concat()),
            url: HTML_URL.to_string(),
        }
    }

    #[test]
    fn test_duckduckgo_request() {
        let ddg = DuckDuckGo::new().unwrap();
        let request = ddg.request("rust programming", 5).unwrap();

        assert!(request.url.starts_with("https://html.duckduckgo.com/html/?q=rust%20programming"));
    }

    #[test]
    fn test_unwraps_uddg_links() {
        let ddg = DuckDuckGo::new().unwrap();
        let blocks = vec![block(
            "The Rust Book",
            "//duckduckgo.com/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F&amp;rut=abc",
            "The Rust Programming Language",
        )];

        let results = ddg.response(page(&blocks), 5).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url(), "https://doc.rust-lang.org/book/");
        assert_eq!(results[0].source(), Source::Fallback);
    }

    #[test]
    fn test_bound_counts_collected_results() {
        let ddg = DuckDuckGo::new().unwrap();
        let blocks = vec![
            block("One", "https://a.example/1", "first"),
            block("Two", "https://a.example/2", ""),
            block("Three", "https://a.example/3", "third"),
            block("Four", "https://a.example/4", "fourth"),
        ];

        let results = ddg.response(page(&blocks), 2).unwrap();

        let urls: Vec<_> = results.iter().map(|r| r.url()).collect();
        assert_eq!(urls, vec!["https://a.example/1", "https://a.example/3"]);
    }

    #[test]
    fn test_http_error_is_failure() {
        let ddg = DuckDuckGo::new().unwrap();
        let response = ProviderResponse {
            status: 403,
            text: String::new(),
            url: HTML_URL.to_string(),
        };
        assert!(ddg.response(response, 5).is_err());
    }
}
