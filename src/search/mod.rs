//! Search orchestration module
//!
//! Ties the result cache and the provider fallback chain together.

mod executor;

pub use executor::Search;
