//! Job status and result handlers

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::JobStatus;

/// `GET /status/:filename`: the full tracked record for an upload
pub async fn status(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state
        .registry
        .get(&filename)
        .ok_or_else(|| Error::JobNotFound(filename))?;
    Ok(Json(serde_json::to_value(record)?))
}

/// `GET /results/:filename`: the record once routing completed; just
/// the current status while the job is still in flight
pub async fn results(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let record = state
        .registry
        .get(&filename)
        .ok_or_else(|| Error::JobNotFound(filename))?;

    if record.status == JobStatus::Completed {
        Ok(Json(serde_json::to_value(record)?))
    } else {
        Ok(Json(json!({ "status": record.status })))
    }
}
