use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::AttendanceStatus;
use super::validate::Validator;
use super::Changeset;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Attendance {
    const TABLE: &'static str = "attendances";
    const NAME: &'static str = "Attendance record";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("student_id", ColumnKind::Uuid),
        col("course_id", ColumnKind::Uuid),
        col("date", ColumnKind::Date),
        col("status", AttendanceStatus::KIND),
        CREATED_AT,
        UPDATED_AT,
    ];
    const SORTABLE: &'static [&'static str] = &["date", "created_at"];
    const DEFAULT_ORDER: &'static str = "date desc";
}

/// Attendance row joined with the student's name and enrollment number
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub full_name: String,
    pub enrollment_number: String,
}

/// Per-course totals for a student's attendance summary
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendance {
    pub course_id: Uuid,
    pub subject_name: String,
    pub subject_code: String,
    pub faculty_name: String,
    pub lecture_type: super::enums::LectureType,
    pub batch: Option<String>,
    pub present: i64,
    pub absent: i64,
    pub total: i64,
    #[sqlx(skip)]
    pub percentage: f64,
}

impl CourseAttendance {
    pub fn with_percentage(mut self) -> Self {
        self.percentage = attendance_percentage(self.present, self.total);
        self
    }
}

/// Percentage of lectures attended, rounded to two places; zero with no lectures.
pub fn attendance_percentage(present: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (present as f64 * 10000.0 / total as f64).round() / 100.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub student_id: Uuid,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendance {
    pub course_id: Uuid,
    pub date: NaiveDate,
    pub records: Vec<AttendanceMark>,
}

impl MarkAttendance {
    pub fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .check(!self.records.is_empty(), "records", "At least one attendance record is required.")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendance {
    pub status: AttendanceStatus,
}

impl Changeset for UpdateAttendance {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }

    fn changes(&self) -> Changes {
        vec![("status", self.status.to_sql())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(attendance_percentage(2, 3), 66.67);
        assert_eq!(attendance_percentage(5, 5), 100.0);
        assert_eq!(attendance_percentage(0, 0), 0.0);
    }

    #[test]
    fn mark_requires_records() {
        let body = MarkAttendance { course_id: Uuid::new_v4(), date: NaiveDate::MIN, records: vec![] };
        assert!(body.validate().is_err());
    }
}
