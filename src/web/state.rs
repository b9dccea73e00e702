//! Application state shared across handlers

use crate::config::Settings;
use crate::search::Search;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search orchestrator
    pub search: Arc<Search>,
}

impl AppState {
    pub fn new(settings: Settings, search: Search) -> Self {
        Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
