use std::sync::Arc;

use crate::config::Config;
use crate::services::doc_store::DocStore;
use crate::ws::relay::Relay;

/// Shared state handed to every HTTP and WebSocket handler
pub struct AppState {
    pub config: Config,
    pub store: DocStore,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(config: Config, store: DocStore) -> Arc<Self> {
        Arc::new(Self {
            config,
            store,
            relay: Arc::new(Relay::new()),
        })
    }
}
