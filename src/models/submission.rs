use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::SubmissionStatus;
use super::validate::{blank_to_none, Validator};
use super::Changeset;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub status: SubmissionStatus,
    pub is_late: bool,
    pub marks_awarded: Option<Decimal>,
    pub feedback: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Submission {
    const TABLE: &'static str = "submissions";
    const NAME: &'static str = "Submission";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("assignment_id", ColumnKind::Uuid),
        col("student_id", ColumnKind::Uuid),
        col("content", ColumnKind::Text),
        col("file_path", ColumnKind::Text),
        col("status", SubmissionStatus::KIND),
        col("is_late", ColumnKind::Bool),
        col("marks_awarded", ColumnKind::Decimal),
        col("feedback", ColumnKind::Text),
        col("submitted_at", ColumnKind::Timestamp),
        col("graded_at", ColumnKind::Timestamp),
        CREATED_AT,
        UPDATED_AT,
    ];
    const SORTABLE: &'static [&'static str] = &["submitted_at", "graded_at", "created_at"];
    const DEFAULT_ORDER: &'static str = "submitted_at desc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] =
        &[("assignmentId", "assignment_id"), ("status", "status")];
}

impl Submission {
    pub fn is_graded(&self) -> bool {
        self.status == SubmissionStatus::Graded
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmission {
    pub assignment_id: Uuid,
    pub content: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmission {
    pub content: Option<String>,
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeSubmission {
    pub marks_awarded: Decimal,
    pub feedback: Option<String>,
}

fn check_body(v: &mut Validator, content: Option<&str>, file_path: Option<&str>, required: bool) {
    let content = blank_to_none(content);
    let file_path = blank_to_none(file_path);
    if required {
        v.check(
            content.is_some() || file_path.is_some(),
            "content",
            "Either content or filePath must be provided.",
        );
    }
    if let Some(content) = &content {
        v.length("content", content, 1, 5000);
    }
    if let Some(file_path) = &file_path {
        v.length("filePath", file_path, 1, 500);
    }
}

impl Changeset for CreateSubmission {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        check_body(&mut v, self.content.as_deref(), self.file_path.as_deref(), true);
        v.finish()
    }

    /// Student, lateness and timestamps are added by the caller.
    fn changes(&self) -> Changes {
        vec![
            ("assignment_id", SqlValue::Uuid(self.assignment_id)),
            ("content", SqlValue::opt_text(blank_to_none(self.content.as_deref()))),
            ("file_path", SqlValue::opt_text(blank_to_none(self.file_path.as_deref()))),
        ]
    }
}

impl Changeset for UpdateSubmission {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        check_body(&mut v, self.content.as_deref(), self.file_path.as_deref(), false);
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if self.content.is_some() {
            changes.push(("content", SqlValue::opt_text(blank_to_none(self.content.as_deref()))));
        }
        if self.file_path.is_some() {
            changes.push(("file_path", SqlValue::opt_text(blank_to_none(self.file_path.as_deref()))));
        }
        changes
    }
}

impl GradeSubmission {
    pub fn validate(&self, total_marks: i32) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.range("marksAwarded", self.marks_awarded, Decimal::ZERO, Decimal::from(total_marks));
        if let Some(feedback) = &self.feedback {
            v.length("feedback", feedback, 0, 2000);
        }
        v.finish()
    }

    pub fn changes(&self, graded_at: DateTime<Utc>) -> Changes {
        vec![
            ("marks_awarded", SqlValue::Decimal(self.marks_awarded.round_dp(2))),
            ("feedback", SqlValue::opt_text(blank_to_none(self.feedback.as_deref()))),
            ("status", SubmissionStatus::Graded.to_sql()),
            ("graded_at", SqlValue::Timestamp(graded_at)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_or_file_is_required() {
        let empty = CreateSubmission { assignment_id: Uuid::new_v4(), content: Some(" ".into()), file_path: None };
        assert!(empty.validate().is_err());
        let with_file = CreateSubmission {
            assignment_id: Uuid::new_v4(),
            content: None,
            file_path: Some("https://drive.google.com/file/d/abc".into()),
        };
        assert!(with_file.validate().is_ok());
    }

    #[test]
    fn grade_is_bounded_by_total_marks() {
        let grade = GradeSubmission { marks_awarded: Decimal::new(215, 1), feedback: None };
        assert!(grade.validate(20).is_err());
        assert!(grade.validate(25).is_ok());
        let negative = GradeSubmission { marks_awarded: Decimal::new(-1, 0), feedback: None };
        assert!(negative.validate(25).is_err());
    }
}
