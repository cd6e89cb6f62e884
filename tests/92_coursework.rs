mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use trackademy_api::models::Role;
use trackademy_api::AppState;

use common::campus::{bearer_for, Campus};

#[tokio::test]
async fn submissions_track_lateness_and_lock_once_graded() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let campus = Campus::create(&db).await?;
    let latecomer = campus.add_student(&db).await?;
    let outsider = campus.add_student(&db).await?;
    campus.enroll(&db, &campus.student).await?;
    campus.enroll(&db, &latecomer).await?;
    let app = trackademy_api::app(AppState::new(db.clone()));
    let faculty = campus.faculty_bearer();

    let assignment = json!({
        "courseId": campus.course.id,
        "title": "Normalisation worksheet",
        "dueDate": (Utc::now() + Duration::days(1)).to_rfc3339(),
        "totalMarks": 10,
    });
    let (status, body) =
        common::send(&app, common::json("POST", "/api/v1/assignments", Some(&faculty), &assignment)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let assignment_id = body["data"]["id"].as_str().expect("assignment id").to_string();

    let student = campus.student_bearer();
    let answer = json!({ "assignmentId": assignment_id, "content": "1NF, 2NF and 3NF answers" });
    let (status, body) = common::send(&app, common::json("POST", "/api/v1/submissions", Some(&student), &answer)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["isLate"], false);
    let submission_id = body["data"]["id"].as_str().expect("submission id").to_string();

    let (status, _) = common::send(&app, common::json("POST", "/api/v1/submissions", Some(&student), &answer)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let outsider_token = bearer_for(outsider.user_id, Role::Student);
    let (status, _) =
        common::send(&app, common::json("POST", "/api/v1/submissions", Some(&outsider_token), &answer)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    sqlx::query("UPDATE assignments SET due_date = now() - interval '1 hour' WHERE id = $1::uuid")
        .bind(&assignment_id)
        .execute(db.pool())
        .await?;
    let late = bearer_for(latecomer.user_id, Role::Student);
    let (status, body) = common::send(&app, common::json("POST", "/api/v1/submissions", Some(&late), &answer)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["isLate"], true);

    let grade_uri = format!("/api/v1/submissions/{submission_id}/grade");
    let (status, body) =
        common::send(&app, common::json("POST", &grade_uri, Some(&faculty), &json!({ "marksAwarded": 11 }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["marksAwarded"].is_string(), "{body}");

    let grade = json!({ "marksAwarded": 8.5, "feedback": "Good decomposition" });
    let (status, body) = common::send(&app, common::json("POST", &grade_uri, Some(&faculty), &grade)).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "GRADED");

    let uri = format!("/api/v1/submissions/{submission_id}");
    let (status, _) =
        common::send(&app, common::json("PATCH", &uri, Some(&student), &json!({ "content": "revised" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = common::send(&app, common::json("DELETE", &uri, Some(&student), &json!({}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::send(&app, common::get(&uri, Some(&late))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn internships_belong_to_their_student() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let campus = Campus::create(&db).await?;
    let classmate = campus.add_student(&db).await?;
    let app = trackademy_api::app(AppState::new(db));
    let owner = campus.student_bearer();
    let other = bearer_for(classmate.user_id, Role::Student);

    let internship = json!({ "companyName": "Infocusp", "role": "Backend intern", "startDate": "2025-05-01" });
    let (status, body) = common::send(&app, common::json("POST", "/api/v1/internships", Some(&owner), &internship)).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["studentId"], campus.student.id.to_string());
    assert_eq!(body["data"]["status"], "APPLIED");
    let uri = format!("/api/v1/internships/{}", body["data"]["id"].as_str().expect("internship id"));

    let (status, _) = common::send(&app, common::get(&uri, Some(&other))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        common::send(&app, common::json("PATCH", &uri, Some(&other), &json!({ "status": "ONGOING" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = common::send(&app, common::json("DELETE", &uri, Some(&other), &json!({}))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(&app, common::get(&uri, Some(&campus.faculty_bearer()))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["companyName"], "Infocusp");

    let (_, body) = common::send(&app, common::get("/api/v1/internships/me", Some(&other))).await?;
    assert_eq!(body["data"]["pagination"]["total"], 0);

    let staff_view = format!("/api/v1/internships/student/{}", campus.student.id);
    let (status, body) = common::send(&app, common::get(&staff_view, Some(&common::bearer(Role::Admin)))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (status, body) =
        common::send(&app, common::json("PATCH", &uri, Some(&owner), &json!({ "status": "ONGOING" }))).await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "ONGOING");
    Ok(())
}
