//! Shared application state

use std::sync::Arc;

use realty_agent::ChatEngine;
use realty_config::Settings;
use realty_gateway::CatalogCache;

/// Everything the handlers need. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ChatEngine>,
    pub catalog: CatalogCache,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(engine: Arc<ChatEngine>, catalog: CatalogCache, settings: Settings) -> Self {
        Self {
            engine,
            catalog,
            settings: Arc::new(settings),
        }
    }
}
