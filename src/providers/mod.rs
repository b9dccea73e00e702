//! Search providers
//!
//! Defines the [`Provider`] capability and the two HTML providers the
//! orchestrator falls back between.

mod client;
mod traits;

pub mod duckduckgo;
pub mod extract;
pub mod google;

pub use client::ProviderClient;
pub use duckduckgo::DuckDuckGo;
pub use google::Google;
pub use traits::*;
