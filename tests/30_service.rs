mod common;

use anyhow::Result;
use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;

fn with_key(method: &str, uri: &str, key: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-api-key", key);
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    builder.body(body).expect("request")
}

#[tokio::test]
async fn service_routes_check_the_api_key() -> Result<()> {
    let app = common::offline_app();

    let (status, _) = common::send(&app, with_key("GET", "/api/v1/service/health", None, None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = common::send(&app, with_key("GET", "/api/v1/service/health", Some("wrong"), None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a user JWT is not a service key
    let admin = common::bearer(trackademy_api::models::Role::Admin);
    let (status, _) = common::send(&app, common::get("/api/v1/service/health", Some(&admin))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn service_health_reports_database_state() -> Result<()> {
    let app = common::offline_app();
    let (status, body) =
        common::send(&app, with_key("GET", "/api/v1/service/health", Some(common::SERVICE_KEY), None)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "trackademy-api");
    assert_eq!(body["data"]["database"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn processed_payloads_are_acknowledged() -> Result<()> {
    let app = common::offline_app();
    let payload = json!({ "LDRP": { "CE": {} } });
    let request = with_key("POST", "/api/v1/service/process-faculty-matrix", Some(common::SERVICE_KEY), Some(payload));
    let (status, body) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    Ok(())
}
