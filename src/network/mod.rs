//! HTTP networking module
//!
//! Provides the outbound HTTP client used by the search providers.

mod client;
mod user_agent;

pub use client::HttpClient;
pub use user_agent::generate_user_agent;
