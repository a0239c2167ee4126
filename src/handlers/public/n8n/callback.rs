// POST /api/webhooks/n8n/callback - n8n reports a finished processing run

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::CallbackPayload;

/// Expected input:
/// ```json
/// { "fileId": "…", "extractedText": "…", "metadata": {…}, "thumbnailUrl": "…", "processed": true }
/// ```
/// Only `fileId` is required. Responds `{ "success": true, "fileId": "…" }`.
pub async fn n8n_callback(
    State(state): State<AppState>,
    payload: Result<Json<CallbackPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::invalid_json(e.body_text()))?;

    let file_id = state.ingestion.ingest(payload).await?;

    Ok(Json(json!({ "success": true, "fileId": file_id })))
}
