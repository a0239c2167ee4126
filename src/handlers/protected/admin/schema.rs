// POST /api/admin/schema/ensure - add extracted_text / metadata if missing

use axum::{extract::State, Extension, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::schema_guard::describe_statuses;
use crate::error::ApiError;
use crate::middleware::AuthUser;

pub async fn schema_ensure(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let table = &state.config.database.files_table;
    let statuses = state.schema.ensure_file_columns(table).await?;
    tracing::info!(user_id = %user.user_id, table = %table, "Schema ensure completed");

    Ok(Json(json!({
        "success": true,
        "message": describe_statuses(&statuses),
        "columns": statuses,
    })))
}
