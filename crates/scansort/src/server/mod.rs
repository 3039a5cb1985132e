//! HTTP server wiring and startup

pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{ProcessingMode, ScanConfig};
use crate::error::Result;
use crate::ocr::TesseractExtractor;
use crate::processing::{WorkQueue, Worker};
use crate::registry::JobRegistry;
use crate::routing::DocumentRouter;
use crate::server::state::AppState;

/// Build the application router with middleware applied
pub fn build_app(state: AppState) -> axum::Router {
    let max_upload = state.config.server.max_upload_size;
    let cors = cors_layer(&state.config.server.allow_origins);
    routes::build_router(state)
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Wire up state, spawn the background tasks and serve until shutdown
pub async fn run(config: ScanConfig) -> Result<()> {
    config.storage.ensure_dirs()?;

    if !TesseractExtractor::has_tesseract() {
        tracing::warn!("tesseract not found on PATH; text extraction will fail");
    }
    if !TesseractExtractor::has_pdftoppm() {
        tracing::warn!("pdftoppm not found on PATH; PDF text extraction will fail");
    }

    let registry = Arc::new(JobRegistry::restore_from_disk(config.snapshot.path.clone()));
    let extractor = Arc::new(TesseractExtractor::new(config.ocr.clone()));
    let router = Arc::new(DocumentRouter::new(
        registry.clone(),
        extractor,
        config.storage.clone(),
    ));
    let queue = Arc::new(WorkQueue::new());

    JobRegistry::spawn_snapshot_task(registry.clone(), config.snapshot.interval_secs);

    if config.mode == ProcessingMode::Async {
        Worker::new(
            queue.clone(),
            registry.clone(),
            router.clone(),
            config.storage.scan_dir.clone(),
        )
        .spawn();
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, registry, router, queue);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
