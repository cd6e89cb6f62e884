use anyhow::Context;
use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::{Database, Repository};
use crate::models::academic_year::CreateAcademicYear;
use crate::models::college::CreateCollege;
use crate::models::department::CreateDepartment;
use crate::models::faculty::CreateFaculty;
use crate::models::student::CreateStudent;
use crate::models::{College, Department, Designation};
use crate::services::academic_year::AcademicYearService;
use crate::auth::hash_password;
use crate::models::Role;
use crate::services::people::{insert_user, PeopleService};
use crate::services::CrudService;
use crate::upload::service::{upsert_division, upsert_semester};

const SEED_PASSWORD: &str = "password123";
const SEED_COLLEGE: &str = "LDRP";

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let db = connect().await?;
    db.migrate().await.context("failed to apply migrations")?;
    db.close().await;
    output_success(&output_format, "Database migrations applied", None)
}

/// Demo data for local development; a no-op once the demo college exists
pub async fn seed(output_format: OutputFormat) -> anyhow::Result<()> {
    if crate::is_production!() {
        anyhow::bail!("refusing to seed demo accounts in production");
    }
    let db = connect().await?;
    let outcome = seed_demo(&db).await;
    db.close().await;

    match outcome? {
        Some(accounts) => output_success(
            &output_format,
            &format!("Seeded demo college; every account uses the password '{}'", SEED_PASSWORD),
            Some(json!({ "accounts": accounts })),
        ),
        None => output_success(&output_format, "Demo college already present, nothing seeded", None),
    }
}

async fn seed_demo(db: &Database) -> anyhow::Result<Option<Vec<String>>> {
    if Repository::<College>::find_by(db.pool(), json!({ "abbreviation": SEED_COLLEGE })).await?.is_some() {
        return Ok(None);
    }

    let crud = CrudService::new(db);
    let college: College = crud
        .create::<College>(&CreateCollege {
            name: "LDRP Institute of Technology and Research".into(),
            abbreviation: SEED_COLLEGE.into(),
            website: Some("https://ldrp.ac.in".into()),
            address: Some("Sector 15, Gandhinagar".into()),
            contact_number: None,
        })
        .await?;
    let year = AcademicYearService::new(db)
        .create(&CreateAcademicYear { year: "2025-2026".into(), college_id: college.id, is_active: true })
        .await?;
    let department: Department = crud
        .create::<Department>(&CreateDepartment {
            name: "Computer Engineering".into(),
            abbreviation: "CE".into(),
            college_id: college.id,
        })
        .await?;
    let semester = upsert_semester(db.pool(), year.id, department.id, 5).await?;
    let division = upsert_division(db.pool(), semester.id, "A").await?;

    // the demo password is below the policy, so accounts skip the request validators
    let mut tx = db.pool().begin().await?;
    let admin = insert_user(&mut tx, "admin@ldrp.ac.in", hash_password(SEED_PASSWORD)?, Role::Admin).await?;
    tx.commit().await?;

    let people = PeopleService::new(db);
    people
        .create_faculty(&CreateFaculty {
            email: "faculty@ldrp.ac.in".into(),
            password: SEED_PASSWORD.into(),
            full_name: "Demo Faculty".into(),
            abbreviation: Some("DFC".into()),
            designation: Designation::AsstProfessor,
            joining_date: None,
            department_id: department.id,
        })
        .await?;
    people
        .create_student(&CreateStudent {
            email: "student@ldrp.ac.in".into(),
            password: SEED_PASSWORD.into(),
            full_name: "Demo Student".into(),
            enrollment_number: "22CE001".into(),
            batch: "A1".into(),
            department_id: department.id,
            semester_id: semester.id,
            division_id: division.id,
        })
        .await?;

    tracing::info!(college_id = %college.id, "Seeded demo data");
    Ok(Some(vec![admin.email, "faculty@ldrp.ac.in".into(), "student@ldrp.ac.in".into()]))
}
