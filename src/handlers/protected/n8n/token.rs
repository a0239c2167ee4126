// GET|POST /api/admin/n8n/token - read or rotate the n8n bearer token

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// GET - current token (the insecure fallback if none was ever issued)
pub async fn token_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let token = state.tokens.current_token().await?;
    tracing::info!(user_id = %user.user_id, "n8n token read");

    Ok(Json(json!({ "token": token })))
}

/// POST - issue a new token; returned only once it has been stored
pub async fn token_rotate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let token = state.tokens.issue_new_token().await?;
    tracing::info!(user_id = %user.user_id, "n8n token rotated");

    Ok(Json(json!({
        "token": token,
        "message": "New n8n token generated. Update the n8n credential to use it."
    })))
}
