use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service description
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "docflow-api",
            "version": version,
            "environment": state.config.environment,
            "n8n_configured": state.config.n8n.webhook_url.is_some(),
            "endpoints": {
                "health": "/health (public)",
                "callback": "POST /api/webhooks/n8n/callback (n8n)",
                "token": "GET|POST /api/admin/n8n/token (protected)",
                "schema": "POST /api/admin/schema/ensure (protected)",
                "webhook_test": "POST /api/webhooks/n8n/test (protected)",
                "dispatch": "POST /api/files/:id/dispatch (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus a database round-trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.files.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
