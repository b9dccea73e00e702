//! Result types shared by providers, the cache and the orchestrator

mod types;

pub use types::*;
