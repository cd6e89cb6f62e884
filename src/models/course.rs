use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::LectureType;
use super::validate::{blank_to_none, Validator};
use super::{Changeset, Creatable, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

/// A subject taught by one faculty member to one division (or batch) in a semester.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub semester_id: Uuid,
    pub division_id: Uuid,
    pub lecture_type: LectureType,
    pub batch: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Course {
    const TABLE: &'static str = "courses";
    const NAME: &'static str = "Course";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("subject_id", ColumnKind::Uuid),
        col("faculty_id", ColumnKind::Uuid),
        col("semester_id", ColumnKind::Uuid),
        col("division_id", ColumnKind::Uuid),
        col("lecture_type", LectureType::KIND),
        col("batch", ColumnKind::Text),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["batch"];
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("subjectId", "subject_id"),
        ("facultyId", "faculty_id"),
        ("semesterId", "semester_id"),
        ("divisionId", "division_id"),
        ("lectureType", "lecture_type"),
        ("batch", "batch"),
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourse {
    pub subject_id: Uuid,
    pub faculty_id: Uuid,
    pub semester_id: Uuid,
    pub division_id: Uuid,
    pub lecture_type: LectureType,
    pub batch: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourse {
    pub faculty_id: Option<Uuid>,
    pub lecture_type: Option<LectureType>,
    pub batch: Option<String>,
}

/// Practicals run per batch, theory lectures for the whole division.
pub fn check_batch(v: &mut Validator, lecture_type: LectureType, batch: Option<&str>) {
    let has_batch = blank_to_none(batch).is_some();
    match lecture_type {
        LectureType::Practical => v.check(has_batch, "batch", "Batch is required for PRACTICAL courses."),
        LectureType::Theory => v.check(!has_batch, "batch", "Batch is only allowed for PRACTICAL courses."),
    };
}

impl Changeset for CreateCourse {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        check_batch(&mut v, self.lecture_type, self.batch.as_deref());
        v.finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("subject_id", SqlValue::Uuid(self.subject_id)),
            ("faculty_id", SqlValue::Uuid(self.faculty_id)),
            ("semester_id", SqlValue::Uuid(self.semester_id)),
            ("division_id", SqlValue::Uuid(self.division_id)),
            ("lecture_type", self.lecture_type.to_sql()),
            ("batch", SqlValue::opt_text(blank_to_none(self.batch.as_deref()))),
        ]
    }
}

impl Changeset for UpdateCourse {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(lecture_type) = self.lecture_type {
            check_batch(&mut v, lecture_type, self.batch.as_deref());
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(faculty_id) = self.faculty_id {
            changes.push(("faculty_id", SqlValue::Uuid(faculty_id)));
        }
        if let Some(lecture_type) = self.lecture_type {
            changes.push(("lecture_type", lecture_type.to_sql()));
            // switching to theory drops the batch
            changes.push(("batch", SqlValue::opt_text(blank_to_none(self.batch.as_deref()))));
        } else if self.batch.is_some() {
            changes.push(("batch", SqlValue::opt_text(blank_to_none(self.batch.as_deref()))));
        }
        changes
    }
}

impl Creatable for Course {
    type Create = CreateCourse;
}

impl Editable for Course {
    type Update = UpdateCourse;
}

/// Body of `POST /courses/:id/enroll`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollStudents {
    pub student_ids: Vec<Uuid>,
}
