mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use trackademy_api::models::Role;

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let app = common::offline_app();

    let (status, body) = common::send(&app, common::get("/api/v1/colleges", None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = common::send(&app, common::get("/api/v1/auth/me", Some("Bearer not-a-jwt"))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn writes_are_limited_by_role() -> Result<()> {
    let app = common::offline_app();
    let student = common::bearer(Role::Student);
    let faculty = common::bearer(Role::Faculty);
    let college = json!({ "name": "LDRP Institute", "abbreviation": "LDRP" });

    let (status, body) = common::send(&app, common::json("POST", "/api/v1/colleges", Some(&student), &college)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = common::send(&app, common::json("POST", "/api/v1/colleges", Some(&faculty), &college)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // faculty and students never reach the student directory
    let (status, _) = common::send(&app, common::get("/api/v1/students", Some(&faculty))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // only faculty create assignments, even admins are refused
    let admin = common::bearer(Role::Admin);
    let (status, _) =
        common::send(&app, common::json("POST", "/api/v1/assignments", Some(&admin), &json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        common::send(&app, common::json("POST", "/api/v1/internships", Some(&faculty), &json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn login_rejects_blank_credentials() -> Result<()> {
    let app = common::offline_app();
    let request = common::json("POST", "/api/v1/auth/login", None, &json!({ "identifier": " ", "password": "" }));
    let (status, body) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> Result<()> {
    let app = common::offline_app();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"identifier\":"))?;
    let (status, body) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    Ok(())
}

#[tokio::test]
async fn malformed_query_strings_use_the_error_envelope() -> Result<()> {
    let app = common::offline_app();
    let admin = common::bearer(Role::Admin);

    let uri = "/api/v1/attendance?courseId=not-a-uuid&date=2025-08-01";
    let (status, body) = common::send(&app, common::get(uri, Some(&admin))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "BAD_REQUEST");

    let uri = "/api/v1/attendance/summary?studentId=nope";
    let (status, body) = common::send(&app, common::get(uri, Some(&admin))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn oversized_page_numbers_are_rejected() -> Result<()> {
    let app = common::offline_app();
    let admin = common::bearer(Role::Admin);

    let uri = format!("/api/v1/colleges?page={}", i64::MAX);
    let (status, body) = common::send(&app, common::get(&uri, Some(&admin))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["page"].is_string());
    Ok(())
}
