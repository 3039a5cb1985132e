//! HTTP route handlers

pub mod files;
pub mod jobs;

use axum::{extract::State, response::IntoResponse, routing::get, routing::post, Json, Router};
use serde_json::json;

use crate::config::ProcessingMode;
use crate::server::state::AppState;

/// Assemble the full route table
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/files/upload", post(files::upload))
        .route("/api/files/list", get(files::list))
        .route("/api/files/:filename", get(files::fetch))
        .route("/api/files/:filename/metadata", get(files::metadata))
        .route("/search", get(files::search))
        .route("/stats", get(files::stats))
        .route("/status/:filename", get(jobs::status))
        .route("/results/:filename", get(jobs::results))
        .with_state(state)
}

/// Service identity banner
async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": "scansort",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": state.config.mode,
    }))
}

/// Liveness probe
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "mode": state.config.mode,
        "queued": match state.config.mode {
            ProcessingMode::Async => Some(state.queue.len()),
            ProcessingMode::Immediate => None,
        },
        "tracked_jobs": state.registry.len(),
        "time": chrono::Utc::now(),
    }))
}
