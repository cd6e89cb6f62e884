use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate::{blank_to_none, Validator};
use super::{Changeset, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub faculty_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_marks: i32,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Assignment {
    const TABLE: &'static str = "assignments";
    const NAME: &'static str = "Assignment";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("course_id", ColumnKind::Uuid),
        col("faculty_id", ColumnKind::Uuid),
        col("title", ColumnKind::Text),
        col("description", ColumnKind::Text),
        col("due_date", ColumnKind::Timestamp),
        col("total_marks", ColumnKind::Int),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "description"];
    const SORTABLE: &'static [&'static str] = &["title", "due_date", "created_at"];
    const DEFAULT_ORDER: &'static str = "due_date asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] =
        &[("courseId", "course_id"), ("facultyId", "faculty_id")];
}

/// Submission counts for one assignment
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStatistics {
    pub total_submissions: i64,
    pub graded_submissions: i64,
    pub pending_submissions: i64,
    pub late_submissions: i64,
    pub average_marks: Option<rust_decimal::Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignment {
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_marks: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignment {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub total_marks: Option<i32>,
}

fn check_due_date(v: &mut Validator, due_date: DateTime<Utc>) {
    v.check(due_date > Utc::now(), "dueDate", "Due date must be in the future.");
}

impl Changeset for CreateAssignment {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("title", &self.title, 1, 200).range("totalMarks", self.total_marks, 1, 1000);
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }
        check_due_date(&mut v, self.due_date);
        v.finish()
    }

    /// The owning faculty is added by the caller.
    fn changes(&self) -> Changes {
        vec![
            ("course_id", SqlValue::Uuid(self.course_id)),
            ("title", SqlValue::text(self.title.trim())),
            ("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))),
            ("due_date", SqlValue::Timestamp(self.due_date)),
            ("total_marks", SqlValue::Int(self.total_marks)),
        ]
    }
}

impl Changeset for UpdateAssignment {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("title", self.title.as_deref(), 1, 200);
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }
        if let Some(total_marks) = self.total_marks {
            v.range("totalMarks", total_marks, 1, 1000);
        }
        if let Some(due_date) = self.due_date {
            check_due_date(&mut v, due_date);
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(title) = &self.title {
            changes.push(("title", SqlValue::text(title.trim())));
        }
        if self.description.is_some() {
            changes.push(("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))));
        }
        if let Some(due_date) = self.due_date {
            changes.push(("due_date", SqlValue::Timestamp(due_date)));
        }
        if let Some(total_marks) = self.total_marks {
            changes.push(("total_marks", SqlValue::Int(total_marks)));
        }
        changes
    }
}

impl Editable for Assignment {
    type Update = UpdateAssignment;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn assignment(due_in: Duration, total_marks: i32) -> CreateAssignment {
        CreateAssignment {
            course_id: Uuid::new_v4(),
            title: "Process scheduling lab".into(),
            description: None,
            due_date: Utc::now() + due_in,
            total_marks,
        }
    }

    #[test]
    fn due_date_must_be_in_the_future() {
        assert!(assignment(Duration::days(7), 20).validate().is_ok());
        assert!(assignment(Duration::days(-1), 20).validate().is_err());
    }

    #[test]
    fn total_marks_are_bounded() {
        assert!(assignment(Duration::days(7), 0).validate().is_err());
        assert!(assignment(Duration::days(7), 1001).validate().is_err());
    }
}
