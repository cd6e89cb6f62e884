mod common;

use anyhow::Result;
use axum::http::StatusCode;

#[tokio::test]
async fn root_lists_endpoints() -> Result<()> {
    let app = common::offline_app();
    let (status, body) = common::send(&app, common::get("/", None)).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Trackademy API");
    assert!(body["data"]["endpoints"]["upload"].is_string());
    Ok(())
}

#[tokio::test]
async fn health_reports_degraded_without_database() -> Result<()> {
    let app = common::offline_app();
    let (status, body) = common::send(&app, common::get("/health", None)).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["database"], "unavailable");
    Ok(())
}

#[tokio::test]
async fn unknown_routes_are_not_found() -> Result<()> {
    let app = common::offline_app();
    let auth = common::bearer(trackademy_api::models::Role::Admin);
    let (status, _) = common::send(&app, common::get("/api/v1/nothing-here", Some(&auth))).await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
