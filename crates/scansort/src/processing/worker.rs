//! Background worker draining the upload queue
//!
//! A single consumer polls the queue every 500ms and routes one document
//! at a time. Routing is blocking work (subprocess OCR, file moves), so
//! each item runs on the blocking pool; the polling task itself stays
//! cheap.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::processing::WorkQueue;
use crate::registry::JobRegistry;
use crate::routing::DocumentRouter;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Single-consumer worker over the upload queue
pub struct Worker {
    queue: Arc<WorkQueue>,
    registry: Arc<JobRegistry>,
    router: Arc<DocumentRouter>,
    scan_dir: PathBuf,
}

impl Worker {
    pub fn new(
        queue: Arc<WorkQueue>,
        registry: Arc<JobRegistry>,
        router: Arc<DocumentRouter>,
        scan_dir: PathBuf,
    ) -> Self {
        Self {
            queue,
            registry,
            router,
            scan_dir,
        }
    }

    /// Spawn the polling loop; runs for the process lifetime
    pub fn spawn(self) {
        tokio::spawn(async move {
            tracing::info!("Worker started, polling every {:?}", POLL_INTERVAL);
            loop {
                match self.queue.pop() {
                    Some(filename) => self.process(filename).await,
                    None => tokio::time::sleep(POLL_INTERVAL).await,
                }
            }
        });
    }

    async fn process(&self, filename: String) {
        let src = self.scan_dir.join(&filename);
        if !src.is_file() {
            // No retry: a queued file that vanished is a terminal error
            tracing::warn!("Queued file '{}' missing from scan directory", filename);
            self.registry.update(&filename, |r| {
                r.mark_error("source file missing from scan directory");
            });
            return;
        }

        let router = self.router.clone();
        let name = filename.clone();
        let result = tokio::task::spawn_blocking(move || router.route(&src, &name)).await;
        match result {
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Routing task panicked for '{}': {}", filename, e);
                self.registry
                    .update(&filename, |r| r.mark_error("routing task failed"));
            }
        }
    }
}
