// POST /api/files/:id/dispatch - forward an uploaded file to n8n for processing

use axum::{
    extract::{Multipart, Path, State},
    Extension, Json,
};
use serde_json::{json, Map, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::DispatchPayload;

/// Multipart input: a required `file` part and an optional `metadata` part
/// holding a JSON object. n8n receives the file plus a metadata sidecar with
/// `fileId` and `uploadedBy` set by the server.
pub async fn file_dispatch(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    state.dispatcher.endpoint()?;

    if state.files.snapshot(&file_id).await?.is_none() {
        return Err(ApiError::not_found(format!("File not found: {}", file_id)));
    }

    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut metadata = Map::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                file = Some((file_name, content_type, bytes.to_vec()));
            }
            Some("metadata") => {
                let text = field.text().await.map_err(|e| ApiError::bad_request(e.body_text()))?;
                metadata = match serde_json::from_str::<Value>(&text) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) => return Err(ApiError::validation_error("metadata must be a JSON object")),
                    Err(e) => return Err(ApiError::invalid_json(format!("metadata: {}", e))),
                };
            }
            _ => {}
        }
    }

    let (file_name, content_type, bytes) =
        file.ok_or_else(|| ApiError::validation_error("multipart field 'file' is required"))?;

    metadata.insert("fileId".to_string(), json!(file_id));
    metadata.insert("uploadedBy".to_string(), json!(user.user_id));

    let payload = DispatchPayload {
        file_name,
        content_type,
        bytes,
        metadata: Value::Object(metadata),
    };

    let token = state.tokens.current_token().await?;
    let response = state.dispatcher.send_file(payload, &token).await?;

    Ok(Json(json!({
        "success": true,
        "fileId": file_id,
        "status": response.status,
    })))
}
