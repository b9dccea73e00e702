//! websearch-rs: cached web search with provider fallback
//!
//! Given a free-text query, returns a bounded, ordered list of web results.
//! Results are scraped from a primary search provider, falling back to a
//! second one when the first fails or is blocked, and cached per
//! normalised query so repeated searches don't hit the network.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod results;
pub mod search;
pub mod web;

pub use config::Settings;
pub use error::SearchError;
pub use results::{SearchResult, Source};
pub use search::Search;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result bound used when a caller has no preference
pub const DEFAULT_MAX_RESULTS: usize = 5;
