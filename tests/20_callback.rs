mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use docflow_api::app::router;
use docflow_api::database::models::FileRecord;
use docflow_api::services::DEFAULT_INSECURE_TOKEN;
use serde_json::{json, Map, Value};

const CALLBACK: &str = "/api/webhooks/n8n/callback";

fn metadata(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn callback_merges_metadata_and_stores_results() -> Result<()> {
    let (app, backends) = common::app();
    backends
        .files
        .insert(FileRecord::pending("doc-1", metadata(json!({"a": 1, "b": 2}))))
        .await;

    let payload = json!({
        "fileId": "doc-1",
        "extractedText": "Quarterly report",
        "metadata": {"b": 3, "c": 4},
        "thumbnailUrl": "https://cdn.example.com/doc-1.png"
    });
    let (status, body) = common::send(&app, common::request(Method::POST, CALLBACK, None, Some(payload))).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "fileId": "doc-1"}));

    let record = backends.files.get("doc-1").await.expect("record");
    assert_eq!(record.extracted_text.as_deref(), Some("Quarterly report"));
    assert_eq!(record.thumbnail.as_deref(), Some("https://cdn.example.com/doc-1.png"));

    let stored = record.metadata.as_object().expect("object");
    assert_eq!(stored.get("a"), Some(&json!(1)));
    assert_eq!(stored.get("b"), Some(&json!(3)));
    assert_eq!(stored.get("c"), Some(&json!(4)));
    assert_eq!(stored.get("processed"), Some(&json!(true)));
    assert_eq!(stored.get("needsProcessing"), Some(&json!(false)));
    assert!(stored.get("updatedAt").and_then(Value::as_str).is_some());
    assert_eq!(stored.len(), 6);
    Ok(())
}

#[tokio::test]
async fn callback_honours_processed_false() -> Result<()> {
    let (app, backends) = common::app();
    backends.files.insert(FileRecord::pending("doc-1", Map::new())).await;

    let payload = json!({"fileId": "doc-1", "processed": false});
    let (status, _) = common::send(&app, common::request(Method::POST, CALLBACK, None, Some(payload))).await?;

    assert_eq!(status, StatusCode::OK);
    let record = backends.files.get("doc-1").await.expect("record");
    assert_eq!(record.metadata["processed"], json!(false));
    assert_eq!(record.metadata["needsProcessing"], json!(false));
    Ok(())
}

#[tokio::test]
async fn callback_without_file_id_is_rejected_before_backend() -> Result<()> {
    let (app, backends) = common::app();

    for payload in [json!({"extractedText": "x"}), json!({"fileId": ""})] {
        let (status, body) = common::send(&app, common::request(Method::POST, CALLBACK, None, Some(payload))).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }

    assert_eq!(backends.files.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn callback_with_malformed_body_is_bad_request() -> Result<()> {
    let (app, backends) = common::app();

    let (status, body) =
        common::send(&app, common::request(Method::POST, CALLBACK, None, Some(json!({"fileId": 42})))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
    assert_eq!(backends.files.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn callback_for_unknown_file_is_not_found_and_creates_nothing() -> Result<()> {
    let (app, backends) = common::app();

    let payload = json!({"fileId": "ghost", "extractedText": "boo"});
    let (status, body) = common::send(&app, common::request(Method::POST, CALLBACK, None, Some(payload))).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(backends.files.get("ghost").await.is_none());
    Ok(())
}

#[tokio::test]
async fn callback_backend_failure_is_server_error_with_message() -> Result<()> {
    let (app, backends) = common::app();
    backends.files.insert(FileRecord::pending("doc-1", Map::new())).await;
    backends.files.fail_with("write timeout");

    let payload = json!({"fileId": "doc-1"});
    let (status, body) = common::send(&app, common::request(Method::POST, CALLBACK, None, Some(payload))).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap_or_default().contains("write timeout"));
    Ok(())
}

#[tokio::test]
async fn callback_token_is_enforced_when_required() -> Result<()> {
    let mut config = common::test_config();
    config.n8n.require_callback_token = true;
    let (state, backends) = common::test_state(config);
    let app = router(state);
    backends.files.insert(FileRecord::pending("doc-1", Map::new())).await;

    let payload = json!({"fileId": "doc-1"});

    let (status, _) =
        common::send(&app, common::request(Method::POST, CALLBACK, None, Some(payload.clone()))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        common::send(&app, common::request(Method::POST, CALLBACK, Some("wrong"), Some(payload.clone()))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Nothing rotated yet, so the fallback token is the current one
    let (status, _) = common::send(
        &app,
        common::request(Method::POST, CALLBACK, Some(DEFAULT_INSECURE_TOKEN), Some(payload)),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}
