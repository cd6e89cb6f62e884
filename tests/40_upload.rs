mod common;

use anyhow::Result;
use axum::http::StatusCode;
use trackademy_api::models::Role;

#[tokio::test]
async fn uploads_are_admin_only() -> Result<()> {
    let app = common::offline_app();
    let faculty = common::bearer(Role::Faculty);
    let request = common::multipart("/api/v1/upload/students", &faculty, &[], Some(&b"irrelevant"[..]));
    let (status, _) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn upload_without_file_is_rejected() -> Result<()> {
    let app = common::offline_app();
    let admin = common::bearer(Role::Admin);
    let request = common::multipart("/api/v1/upload/faculty", &admin, &[("note", "no file attached")], None);
    let (status, body) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No Excel file was uploaded.");
    Ok(())
}

#[tokio::test]
async fn non_excel_files_are_rejected_before_touching_the_database() -> Result<()> {
    let app = common::offline_app();
    let admin = common::bearer(Role::Admin);
    let request = common::multipart("/api/v1/upload/faculty", &admin, &[], Some(&b"name,email\nA,a@b.c\n"[..]));
    let (status, body) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn practical_attendance_needs_a_batch() -> Result<()> {
    let app = common::offline_app();
    let admin = common::bearer(Role::Admin);
    let id = uuid::Uuid::new_v4().to_string();
    let fields = [
        ("academicYearId", id.as_str()),
        ("departmentId", id.as_str()),
        ("semesterNumber", "5"),
        ("divisionId", id.as_str()),
        ("subjectId", id.as_str()),
        ("lectureType", "PRACTICAL"),
        ("date", "2025-08-14"),
    ];
    let request = common::multipart("/api/v1/upload/attendance", &admin, &fields, Some(&b"placeholder"[..]));
    let (status, body) = common::send(&app, request).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing or invalid form field 'batch'.");
    Ok(())
}
