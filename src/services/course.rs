use serde::Serialize;
use uuid::Uuid;

use crate::database::{Database, Repository};
use crate::error::ApiError;
use crate::models::{Course, Student};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentOutcome {
    pub course_id: Uuid,
    pub enrolled_count: u64,
    pub skipped_count: u64,
}

pub struct CourseService<'a> {
    db: &'a Database,
}

impl<'a> CourseService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Enroll students in a course; existing enrollments are left alone.
    pub async fn enroll(&self, course_id: Uuid, student_ids: &[Uuid]) -> Result<EnrollmentOutcome, ApiError> {
        Repository::<Course>::get(self.db.pool(), course_id).await?;
        if student_ids.is_empty() {
            return Err(ApiError::bad_request("studentIds must contain at least one student."));
        }

        let mut tx = self.db.pool().begin().await?;
        let mut enrolled = 0;
        for student_id in student_ids {
            if Repository::<Student>::find(&mut *tx, *student_id).await?.is_none() {
                return Err(ApiError::bad_request(format!("Student {} does not exist.", student_id)));
            }
            let result = sqlx::query(
                "INSERT INTO student_enrollments (id, student_id, course_id) VALUES ($1, $2, $3) \
                 ON CONFLICT (student_id, course_id) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(student_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
            enrolled += result.rows_affected();
        }
        tx.commit().await?;

        let skipped = student_ids.len() as u64 - enrolled;
        tracing::info!(%course_id, enrolled, skipped, "Enrolled students");
        Ok(EnrollmentOutcome { course_id, enrolled_count: enrolled, skipped_count: skipped })
    }

    pub async fn is_enrolled(&self, course_id: Uuid, student_id: Uuid) -> Result<bool, ApiError> {
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM student_enrollments WHERE course_id = $1 AND student_id = $2")
                .bind(course_id)
                .bind(student_id)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(found.is_some())
    }
}
