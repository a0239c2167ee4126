mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use docflow_api::services::DEFAULT_INSECURE_TOKEN;

const TOKEN: &str = "/api/admin/n8n/token";

#[tokio::test]
async fn token_routes_require_session() -> Result<()> {
    let (app, _) = common::app();

    for method in [Method::GET, Method::POST] {
        let (status, body) = common::send(&app, common::request(method.clone(), TOKEN, None, None)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method}");
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = common::send(&app, common::request(method, TOKEN, Some("not-a-jwt"), None)).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

#[tokio::test]
async fn token_get_falls_back_when_never_rotated() -> Result<()> {
    let (app, _) = common::app();
    let session = common::session_token("admin-1");

    let (status, body) = common::send(&app, common::request(Method::GET, TOKEN, Some(&session), None)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"], DEFAULT_INSECURE_TOKEN);
    Ok(())
}

#[tokio::test]
async fn rotated_token_is_returned_by_next_read() -> Result<()> {
    let (app, _) = common::app();
    let session = common::session_token("admin-1");

    let (status, rotated) = common::send(&app, common::request(Method::POST, TOKEN, Some(&session), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(rotated["message"].is_string());
    let issued = rotated["token"].as_str().expect("token").to_string();
    assert!(issued.starts_with("n8n_"));

    let (status, current) = common::send(&app, common::request(Method::GET, TOKEN, Some(&session), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["token"], issued.as_str());
    Ok(())
}

#[tokio::test]
async fn failed_rotation_returns_500_without_token() -> Result<()> {
    let (app, backends) = common::app();
    backends.credentials.fail_writes("read-only transaction");
    let session = common::session_token("admin-1");

    let (status, body) = common::send(&app, common::request(Method::POST, TOKEN, Some(&session), None)).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.get("token").is_none());
    assert!(body["error"].as_str().unwrap_or_default().contains("read-only transaction"));
    Ok(())
}

#[tokio::test]
async fn token_lookup_failure_is_500() -> Result<()> {
    let (app, backends) = common::app();
    backends.credentials.fail_reads("pool timed out");
    let session = common::session_token("admin-1");

    let (status, _) = common::send(&app, common::request(Method::GET, TOKEN, Some(&session), None)).await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
