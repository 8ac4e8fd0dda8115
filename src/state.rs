use std::sync::Arc;

use crate::db::Store;
use crate::sync::SyncOrchestrator;

/// Shared by every request handler and the scheduler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(orchestrator: SyncOrchestrator, store: Arc<dyn Store>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            store,
        }
    }
}
