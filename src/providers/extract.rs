//! Result block extraction shared by the HTML providers
//!
//! Each provider describes its markup with a [`BlockSelectors`] set and a
//! redirect-unwrapping rule; the loop that walks the document, skips
//! malformed blocks and enforces the result bound lives here.

use crate::results::{SearchResult, Source};
use anyhow::anyhow;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Compile a CSS selector
pub fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {:?}: {:?}", css, e))
}

/// Structural selectors for one provider's result page
#[derive(Debug, Clone)]
pub struct BlockSelectors {
    /// Repeated result container
    pub container: Selector,
    /// Title element, searched within the container
    pub title: Selector,
    /// Link element carrying the result href
    pub link: Selector,
    /// Snippet element
    pub snippet: Selector,
}

impl BlockSelectors {
    pub fn parse(container: &str, title: &str, link: &str, snippet: &str) -> anyhow::Result<Self> {
        Ok(Self {
            container: selector(container)?,
            title: selector(title)?,
            link: selector(link)?,
            snippet: selector(snippet)?,
        })
    }
}

/// Walk `html` in document order and collect up to `max_results` results.
///
/// A block missing a title, a usable href or a snippet is skipped and does
/// not count toward the bound. `resolve` turns a raw href into an absolute
/// URL or rejects it.
pub fn extract_results<F>(
    html: &str,
    selectors: &BlockSelectors,
    max_results: usize,
    source: Source,
    resolve: F,
) -> Vec<SearchResult>
where
    F: Fn(&str) -> Option<String>,
{
    let document = Html::parse_document(html);
    let mut results = Vec::new();

    if max_results == 0 {
        return results;
    }

    for block in document.select(&selectors.container) {
        let title = first_text(&block, &selectors.title);
        if title.is_empty() {
            continue;
        }

        let url = match block
            .select(&selectors.link)
            .filter_map(|a| a.value().attr("href"))
            .next()
            .and_then(&resolve)
        {
            Some(url) => url,
            None => continue,
        };

        let snippet = first_text(&block, &selectors.snippet);
        if snippet.is_empty() {
            continue;
        }

        results.push(SearchResult::new(title, url, snippet, source));
        if results.len() >= max_results {
            break;
        }
    }

    results
}

/// Whether `html` contains at least one result container
pub fn has_blocks(html: &str, selectors: &BlockSelectors) -> bool {
    Html::parse_document(html)
        .select(&selectors.container)
        .next()
        .is_some()
}

fn first_text(block: &ElementRef<'_>, selector: &Selector) -> String {
    block
        .select(selector)
        .next()
        .map(|el| clean_text(&el.text().collect::<String>()))
        .unwrap_or_default()
}

/// Collapse runs of whitespace and trim
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve an href against the page it was found on.
///
/// `//host/x` becomes `https://host/x` regardless of the page scheme;
/// relative paths are joined to `base`. Only http(s) URLs survive.
pub fn absolutize(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let url = match href.strip_prefix("//") {
        Some(rest) => Url::parse(&format!("https://{}", rest)).ok()?,
        None => base.join(href).ok()?,
    };

    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Full href normalisation: absolutize, then unwrap a provider redirect
/// wrapper if `unwrap` recognises one, then absolutize the target.
pub fn normalize_href(href: &str, base: &Url, unwrap: fn(&Url) -> Option<String>) -> Option<String> {
    let url = absolutize(href, base)?;
    match unwrap(&url) {
        Some(target) => absolutize(&target, base).map(String::from),
        None => Some(url.into()),
    }
}

/// Value of the first query parameter named `key`
pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
