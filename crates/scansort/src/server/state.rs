//! Shared application state

use std::sync::Arc;

use crate::config::ScanConfig;
use crate::processing::WorkQueue;
use crate::registry::JobRegistry;
use crate::routing::DocumentRouter;
use crate::storage::FileStore;

/// State threaded through every handler. Cloning is cheap; everything
/// mutable lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ScanConfig>,
    pub registry: Arc<JobRegistry>,
    pub router: Arc<DocumentRouter>,
    pub queue: Arc<WorkQueue>,
    pub store: FileStore,
}

impl AppState {
    pub fn new(
        config: ScanConfig,
        registry: Arc<JobRegistry>,
        router: Arc<DocumentRouter>,
        queue: Arc<WorkQueue>,
    ) -> Self {
        let store = FileStore::new(config.storage.clone());
        Self {
            config: Arc::new(config),
            registry,
            router,
            queue,
            store,
        }
    }
}
