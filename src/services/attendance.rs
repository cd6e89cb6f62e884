use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::{Database, Repository};
use crate::error::ApiError;
use crate::models::attendance::{AttendanceEntry, CourseAttendance, MarkAttendance, UpdateAttendance};
use crate::models::{Attendance, AttendanceStatus, Changeset, Course, Student};

pub struct AttendanceService<'a> {
    db: &'a Database,
}

impl<'a> AttendanceService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn for_course_on(&self, course_id: Uuid, date: NaiveDate) -> Result<Vec<AttendanceEntry>, ApiError> {
        Ok(sqlx::query_as::<_, AttendanceEntry>(
            "SELECT a.id, a.student_id, a.course_id, a.date, a.status, s.full_name, s.enrollment_number \
             FROM attendances a JOIN students s ON s.id = a.student_id \
             WHERE a.course_id = $1 AND a.date = $2 \
             ORDER BY s.enrollment_number",
        )
        .bind(course_id)
        .bind(date)
        .fetch_all(self.db.pool())
        .await?)
    }

    /// Per-course totals over the courses a student is enrolled in for a semester
    pub async fn summary(&self, student_id: Uuid, semester_id: Uuid) -> Result<Vec<CourseAttendance>, ApiError> {
        if Repository::<Student>::find(self.db.pool(), student_id).await?.is_none() {
            return Err(ApiError::not_found("Student not found."));
        }
        let rows = sqlx::query_as::<_, CourseAttendance>(
            "SELECT c.id AS course_id, sub.name AS subject_name, sub.code AS subject_code, \
                    f.full_name AS faculty_name, c.lecture_type, c.batch, \
                    COUNT(a.id) FILTER (WHERE a.status = 'PRESENT') AS present, \
                    COUNT(a.id) FILTER (WHERE a.status = 'ABSENT') AS absent, \
                    COUNT(a.id) AS total \
             FROM student_enrollments se \
             JOIN courses c ON c.id = se.course_id AND c.is_deleted = false \
             JOIN subjects sub ON sub.id = c.subject_id \
             JOIN faculties f ON f.id = c.faculty_id \
             LEFT JOIN attendances a ON a.course_id = c.id AND a.student_id = se.student_id \
             WHERE se.student_id = $1 AND c.semester_id = $2 \
             GROUP BY c.id, sub.name, sub.code, f.full_name \
             ORDER BY sub.code, c.lecture_type",
        )
        .bind(student_id)
        .bind(semester_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(CourseAttendance::with_percentage).collect())
    }

    pub async fn mark(&self, input: &MarkAttendance) -> Result<Vec<Attendance>, ApiError> {
        input.validate()?;
        Repository::<Course>::get(self.db.pool(), input.course_id).await?;

        let mut tx = self.db.pool().begin().await?;
        let mut marked = Vec::with_capacity(input.records.len());
        for record in &input.records {
            marked.push(upsert(&mut *tx, record.student_id, input.course_id, input.date, record.status).await?);
        }
        tx.commit().await?;

        tracing::info!(course_id = %input.course_id, date = %input.date, count = marked.len(), "Marked attendance");
        Ok(marked)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateAttendance) -> Result<Attendance, ApiError> {
        Ok(Repository::<Attendance>::update(self.db.pool(), id, input.changes()).await?)
    }
}

/// Insert or overwrite one student's status for a course on a date
pub async fn upsert<'c, E>(
    executor: E,
    student_id: Uuid,
    course_id: Uuid,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<Attendance, ApiError>
where
    E: PgExecutor<'c>,
{
    Ok(sqlx::query_as::<_, Attendance>(
        "INSERT INTO attendances (id, student_id, course_id, date, status) \
         VALUES ($1, $2, $3, $4, $5::attendance_status) \
         ON CONFLICT (student_id, course_id, date) \
         DO UPDATE SET status = EXCLUDED.status, updated_at = now() \
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(course_id)
    .bind(date)
    .bind(status.as_str())
    .fetch_one(executor)
    .await?)
}
