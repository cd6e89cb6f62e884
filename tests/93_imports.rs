mod common;

use anyhow::Result;
use serde_json::json;
use uuid::Uuid;

use trackademy_api::models::{AcademicYear, College, Department, Designation};
use trackademy_api::services::mail::MemoryMailer;
use trackademy_api::services::people::PeopleService;
use trackademy_api::upload::rows::{FacultyRow, StudentRow};
use trackademy_api::upload::service::upsert_academic_year;
use trackademy_api::upload::{Tally, UploadService};

use common::campus::{insert, unique, Campus};

fn student_row(enrollment_number: &str, email: &str, department: &str, academic_year: &str) -> StudentRow {
    StudentRow {
        full_name: format!("Imported {enrollment_number}"),
        enrollment_number: enrollment_number.into(),
        department: department.into(),
        semester_number: 3,
        division: "b".into(),
        batch: "B1".into(),
        email: email.into(),
        academic_year: academic_year.into(),
    }
}

fn recipients(mailer: &MemoryMailer) -> Vec<String> {
    mailer.sent.lock().map(|sent| sent.iter().map(|(email, _)| email.clone()).collect()).unwrap_or_default()
}

#[tokio::test]
async fn student_import_revives_deleted_years_and_skips_bad_rows() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    // student imports land in the oldest college; make sure there is one
    Campus::create(&db).await?;
    let college: College =
        sqlx::query_as("SELECT * FROM colleges WHERE is_deleted = false ORDER BY created_at ASC LIMIT 1")
            .fetch_one(db.pool())
            .await?;
    let abbreviation = unique("IM");
    let department: Department = insert(
        &db,
        json!({ "name": format!("Imports {abbreviation}"), "abbreviation": abbreviation, "collegeId": college.id }),
    )
    .await?;

    let first = 2100 + (Uuid::new_v4().as_u128() % 7000) as i32;
    let deleted_year = format!("{}-{}", first, first + 1);
    let fresh_year = format!("{}-{}", first + 1, first + 2);
    let deleted = upsert_academic_year(db.pool(), college.id, &deleted_year).await?;
    sqlx::query("UPDATE academic_years SET is_deleted = true WHERE id = $1").bind(deleted.id).execute(db.pool()).await?;

    let (kept, revived) = (unique("EN"), unique("EN"));
    let email = |enrollment: &str| format!("{}@import.tests.local", enrollment.to_lowercase());
    let rows = vec![
        (2, student_row(&kept, &email(&kept), &abbreviation, &fresh_year)),
        (3, student_row(&revived, &email(&revived), &abbreviation, &deleted_year)),
        (4, student_row(&unique("EN"), "nobody@import.tests.local", "NOPE", &fresh_year)),
        // same enrollment number again, under a new email
        (5, student_row(&kept, "twin@import.tests.local", &abbreviation, &fresh_year)),
    ];

    let mailer = MemoryMailer::default();
    let summary = UploadService::new(&db, &mailer).student_rows(rows, Tally::default()).await?;
    assert_eq!(summary.created_count, 2, "{summary:?}");
    assert_eq!(summary.skipped_count, 2, "{summary:?}");
    assert_eq!(recipients(&mailer), vec![email(&kept), email(&revived)]);

    let year: AcademicYear = sqlx::query_as("SELECT * FROM academic_years WHERE id = $1")
        .bind(deleted.id)
        .fetch_one(db.pool())
        .await?;
    assert!(!year.is_deleted);
    assert!(!year.is_active);

    let people = PeopleService::new(&db);
    let student = people.student_by_enrollment(&revived).await?;
    assert_eq!(student.department_id, department.id);
    let semester_year: Uuid = sqlx::query_scalar("SELECT academic_year_id FROM semesters WHERE id = $1")
        .bind(student.semester_id)
        .fetch_one(db.pool())
        .await?;
    assert_eq!(semester_year, deleted.id);
    let division: String = sqlx::query_scalar("SELECT name FROM divisions WHERE id = $1")
        .bind(student.division_id)
        .fetch_one(db.pool())
        .await?;
    assert_eq!(division, "B");
    Ok(())
}

#[tokio::test]
async fn faculty_import_mails_only_created_accounts() -> Result<()> {
    let Some(db) = common::database().await? else { return Ok(()) };
    let campus = Campus::create(&db).await?;
    let tag = unique("F").to_lowercase();
    let row = |email: &str, college: &str| FacultyRow {
        full_name: "Meera Shah".into(),
        email: email.into(),
        abbreviation: Some("MRS".into()),
        designation: Designation::AsstProfessor,
        department: campus.department.name.to_lowercase(),
        joining_date: None,
        college: college.into(),
    };
    let email = format!("{tag}@faculty.tests.local");
    let rows = vec![
        (2, row(&email, &campus.college.abbreviation.to_lowercase())),
        (3, row(&format!("{tag}.other@faculty.tests.local"), "NOWHERE")),
        (4, row(&email, &campus.college.abbreviation)),
    ];

    let mailer = MemoryMailer::default();
    let summary = UploadService::new(&db, &mailer).faculty_rows(rows, Tally::default()).await?;
    assert_eq!((summary.created_count, summary.skipped_count), (1, 2), "{summary:?}");
    assert_eq!(recipients(&mailer), vec![email]);
    Ok(())
}
