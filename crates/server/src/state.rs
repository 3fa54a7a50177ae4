use std::sync::Arc;

use mediaferry_core::{Config, IngestService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<IngestService>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<IngestService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &Arc<IngestService> {
        &self.service
    }
}
