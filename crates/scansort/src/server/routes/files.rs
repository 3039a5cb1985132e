//! File intake and retrieval handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::config::ProcessingMode;
use crate::error::{Error, Result};
use crate::server::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Deserialize)]
pub struct ListQuery {
    /// Optional directory filter: scan, fully_indexed, partially_indexed
    /// or failed
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// Reject the request when an API key is configured and the header does
/// not match. An empty configured key disables the check.
fn check_api_key(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let expected = &state.config.server.api_key;
    if expected.is_empty() {
        return Ok(());
    }
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided == expected {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}

/// `POST /api/files/upload`: accept one multipart document, register a
/// job for it, and either route it inline or enqueue it for the worker.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    check_api_key(&state, &headers)?;

    let mut saved: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Multipart read failed: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(|n| n.to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::Config("Upload is missing a filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::internal(format!("Upload read failed: {}", e)))?;

        tokio::fs::create_dir_all(&state.config.storage.scan_dir).await?;
        // Same-name resubmission overwrites the pending scan file
        tokio::fs::write(state.config.storage.scan_dir.join(&filename), &data).await?;
        tracing::info!("Received '{}' ({} bytes)", filename, data.len());
        saved = Some(filename);
        break;
    }

    let filename = saved.ok_or_else(|| Error::Config("No 'file' field in upload".to_string()))?;
    state.registry.create(&filename);

    match state.config.mode {
        ProcessingMode::Immediate => {
            let router = state.router.clone();
            let src = state.config.storage.scan_dir.join(&filename);
            let name = filename.clone();
            let record = match tokio::task::spawn_blocking(move || router.route(&src, &name)).await
            {
                Ok(record) => record.ok_or_else(|| Error::JobNotFound(filename))?,
                Err(e) => {
                    // Same downgrade the worker applies: the job must
                    // still reach a terminal state
                    tracing::error!("Routing task panicked for '{}': {}", filename, e);
                    state
                        .registry
                        .update(&filename, |r| r.mark_error("routing task failed"));
                    return Err(Error::internal(format!("Routing task failed: {}", e)));
                }
            };
            Ok(Json(serde_json::to_value(record)?))
        }
        ProcessingMode::Async => {
            state.registry.update(&filename, |r| r.mark_queued());
            state.queue.push(&filename);
            Ok(Json(json!({
                "status": "queued",
                "filename": filename,
            })))
        }
    }
}

/// `GET /api/files/list?status=`: filenames per directory, or the union
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let files = state.store.list_files(query.status.as_deref())?;
    Ok(Json(json!({
        "count": files.len(),
        "files": files,
    })))
}

/// `GET /api/files/:filename`: raw file bytes with a guessed MIME type
pub async fn fetch(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let path = state.store.fetch_file(&filename)?;
    let bytes = tokio::fs::read(&path).await?;
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// `GET /api/files/:filename/metadata`
pub async fn metadata(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let meta = state.store.metadata(&filename)?;
    Ok(Json(meta))
}

/// `GET /search?q=`: case-insensitive filename substring search
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> impl IntoResponse {
    let matches = state.store.search(&query.q);
    Json(json!({
        "query": query.q,
        "count": matches.len(),
        "matches": matches,
    }))
}

/// `GET /stats`: directory counts plus job totals by status
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let directories = state.store.stats();
    let jobs = state.registry.list();
    let mut by_status = std::collections::BTreeMap::new();
    for job in &jobs {
        *by_status
            .entry(format!("{:?}", job.status).to_lowercase())
            .or_insert(0usize) += 1;
    }
    Json(json!({
        "directories": directories,
        "jobs": {
            "total": jobs.len(),
            "by_status": by_status,
        },
    }))
}
