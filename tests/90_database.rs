mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use trackademy_api::models::Role;
use trackademy_api::services::auth::{AuthService, RegisterAdminRequest};
use trackademy_api::AppState;

use common::campus::unique;

#[tokio::test]
async fn college_lifecycle() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let app = trackademy_api::app(AppState::new(db));
    let admin = common::bearer(Role::Admin);
    let abbreviation = unique("C");

    let create = json!({ "name": format!("College {}", abbreviation), "abbreviation": abbreviation });
    let (status, body) = common::send(&app, common::json("POST", "/api/v1/colleges", Some(&admin), &create)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = common::send(&app, common::json("POST", "/api/v1/colleges", Some(&admin), &create)).await?;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let student = common::bearer(Role::Student);
    let (status, body) = common::send(&app, common::get(&format!("/api/v1/colleges/{id}"), Some(&student))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["abbreviation"], abbreviation);

    let uri = format!("/api/v1/colleges/{id}");
    let (status, _) = common::send(&app, common::json("DELETE", &uri, Some(&admin), &json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::send(&app, common::get(&uri, Some(&admin))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let restore = format!("/api/v1/colleges/{id}/restore");
    let (status, body) = common::send(&app, common::json("POST", &restore, Some(&admin), &json!({}))).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["isDeleted"], false);

    let permanent = format!("/api/v1/colleges/{id}/permanent");
    let (status, _) = common::send(&app, common::json("DELETE", &permanent, Some(&admin), &json!({}))).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn invalid_college_reports_field_errors() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let app = trackademy_api::app(AppState::new(db));
    let admin = common::bearer(Role::Admin);

    let create = json!({ "name": "X", "abbreviation": "LONG-ENOUGH", "website": "not a url" });
    let (status, body) = common::send(&app, common::json("POST", "/api/v1/colleges", Some(&admin), &create)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["website"].is_string());
    Ok(())
}

#[tokio::test]
async fn academic_year_activation_is_exclusive() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let app = trackademy_api::app(AppState::new(db));
    let admin = common::bearer(Role::Admin);
    let abbreviation = unique("Y");

    let college = json!({ "name": format!("College {}", abbreviation), "abbreviation": abbreviation });
    let (_, body) = common::send(&app, common::json("POST", "/api/v1/colleges", Some(&admin), &college)).await?;
    let college_id = body["data"]["id"].as_str().expect("college id").to_string();

    let mut years = Vec::new();
    for year in ["2024-2025", "2025-2026"] {
        let create = json!({ "year": year, "collegeId": college_id, "isActive": true });
        let (status, body) =
            common::send(&app, common::json("POST", "/api/v1/academic-years", Some(&admin), &create)).await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        years.push(body["data"]["id"].as_str().expect("year id").to_string());
    }

    let (status, body) = common::send(
        &app,
        common::get(&format!("/api/v1/academic-years/active?collegeId={college_id}"), Some(&admin)),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], years[1]);

    let activate = format!("/api/v1/academic-years/{}/activate", years[0]);
    let (status, body) = common::send(&app, common::json("POST", &activate, Some(&admin), &json!({}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], true);

    let (_, body) = common::send(&app, common::get(&format!("/api/v1/academic-years/{}", years[1]), Some(&admin))).await?;
    assert_eq!(body["data"]["isActive"], false);
    Ok(())
}

#[tokio::test]
async fn admin_registration_needs_an_admin_once_one_exists() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let service = AuthService::new(&db);
    let password = "Bootstrap@2025".to_string();
    service
        .register_admin(&RegisterAdminRequest { email: format!("{}@admins.tests.local", unique("a").to_lowercase()), password })
        .await?;
    let app = trackademy_api::app(AppState::new(db));

    let request = |email: String| json!({ "email": format!("{}@admins.tests.local", email.to_lowercase()), "password": "Another@2025" });
    let uri = "/api/v1/auth/register/admin";

    let (status, _) = common::send(&app, common::json("POST", uri, None, &request(unique("b")))).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let faculty = common::bearer(Role::Faculty);
    let (status, _) = common::send(&app, common::json("POST", uri, Some(&faculty), &request(unique("c")))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = common::bearer(Role::Admin);
    let (status, body) = common::send(&app, common::json("POST", uri, Some(&admin), &request(unique("d")))).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["role"], "ADMIN");
    assert!(body["data"].get("passwordHash").is_none());
    Ok(())
}
