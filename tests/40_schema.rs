mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

const ENSURE: &str = "/api/admin/schema/ensure";

#[tokio::test]
async fn schema_ensure_requires_session() -> Result<()> {
    let (app, backends) = common::app();

    let (status, _) = common::send(&app, common::request(Method::POST, ENSURE, None, None)).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(backends.catalog.inspect_count(), 0);
    Ok(())
}

#[tokio::test]
async fn schema_ensure_adds_then_reports_present() -> Result<()> {
    let (app, backends) = common::app();
    let session = common::session_token("admin-1");

    let (status, first) = common::send(&app, common::request(Method::POST, ENSURE, Some(&session), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "Added columns: extracted_text, metadata");
    assert_eq!(
        first["columns"],
        json!([
            {"column": "extracted_text", "already_present": false},
            {"column": "metadata", "already_present": false}
        ])
    );

    let (status, second) = common::send(&app, common::request(Method::POST, ENSURE, Some(&session), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["message"], "Columns already present: extracted_text, metadata");
    assert_eq!(backends.catalog.alter_count(), 2);

    let columns = backends.catalog.columns("files").await;
    assert!(columns.contains(&"extracted_text".to_string()));
    assert!(columns.contains(&"metadata".to_string()));
    Ok(())
}

#[tokio::test]
async fn schema_ensure_failure_is_500_with_error() -> Result<()> {
    let mut config = common::test_config();
    config.database.files_table = "uploads".to_string();
    let (state, _) = common::test_state(config);
    let app = docflow_api::app::router(state);
    let session = common::session_token("admin-1");

    let (status, body) = common::send(&app, common::request(Method::POST, ENSURE, Some(&session), None)).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap_or_default().contains("uploads"));
    Ok(())
}
