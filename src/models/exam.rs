use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::ExamType;
use super::validate::{blank_to_none, Validator};
use super::{Changeset, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: Uuid,
    pub name: String,
    pub exam_type: ExamType,
    pub semester_id: Uuid,
    pub description: Option<String>,
    pub max_marks: Option<i32>,
    pub pass_marks: Option<i32>,
    pub exam_date: Option<NaiveDate>,
    pub is_published: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Exam {
    const TABLE: &'static str = "exams";
    const NAME: &'static str = "Exam";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("name", ColumnKind::Text),
        col("exam_type", ExamType::KIND),
        col("semester_id", ColumnKind::Uuid),
        col("description", ColumnKind::Text),
        col("max_marks", ColumnKind::Int),
        col("pass_marks", ColumnKind::Int),
        col("exam_date", ColumnKind::Date),
        col("is_published", ColumnKind::Bool),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "description"];
    const SORTABLE: &'static [&'static str] = &["name", "exam_date", "created_at"];
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("semesterId", "semester_id"),
        ("examType", "exam_type"),
        ("isPublished", "is_published"),
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExam {
    pub name: String,
    pub exam_type: ExamType,
    pub semester_id: Uuid,
    pub description: Option<String>,
    pub max_marks: Option<i32>,
    pub pass_marks: Option<i32>,
    pub exam_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExam {
    pub name: Option<String>,
    pub description: Option<String>,
    pub max_marks: Option<i32>,
    pub pass_marks: Option<i32>,
    pub exam_date: Option<NaiveDate>,
    pub is_published: Option<bool>,
}

fn check_marks(v: &mut Validator, max_marks: Option<i32>, pass_marks: Option<i32>) {
    if let Some(max) = max_marks {
        v.range("maxMarks", max, 1, 1000);
    }
    if let Some(pass) = pass_marks {
        v.check(pass >= 0, "passMarks", "Pass marks cannot be negative.");
    }
    if let (Some(max), Some(pass)) = (max_marks, pass_marks) {
        v.check(pass <= max, "passMarks", "Pass marks cannot be greater than maximum marks.");
    }
}

impl Changeset for CreateExam {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("name", &self.name, 1, 255);
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }
        check_marks(&mut v, self.max_marks, self.pass_marks);
        v.finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("name", SqlValue::text(self.name.trim())),
            ("exam_type", self.exam_type.to_sql()),
            ("semester_id", SqlValue::Uuid(self.semester_id)),
            ("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))),
            ("max_marks", SqlValue::opt_int(self.max_marks)),
            ("pass_marks", SqlValue::opt_int(self.pass_marks)),
            ("exam_date", SqlValue::opt_date(self.exam_date)),
            ("is_published", SqlValue::Bool(self.is_published)),
        ]
    }
}

impl Changeset for UpdateExam {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("name", self.name.as_deref(), 1, 255);
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }
        check_marks(&mut v, self.max_marks, self.pass_marks);
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(name) = &self.name {
            changes.push(("name", SqlValue::text(name.trim())));
        }
        if self.description.is_some() {
            changes.push(("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))));
        }
        if let Some(max) = self.max_marks {
            changes.push(("max_marks", SqlValue::Int(max)));
        }
        if let Some(pass) = self.pass_marks {
            changes.push(("pass_marks", SqlValue::Int(pass)));
        }
        if let Some(date) = self.exam_date {
            changes.push(("exam_date", SqlValue::Date(date)));
        }
        if let Some(published) = self.is_published {
            changes.push(("is_published", SqlValue::Bool(published)));
        }
        changes
    }
}

impl Editable for Exam {
    type Update = UpdateExam;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_marks_cannot_exceed_max_marks() {
        let exam = CreateExam {
            name: "Final Examination".into(),
            exam_type: ExamType::Final,
            semester_id: Uuid::new_v4(),
            description: None,
            max_marks: Some(70),
            pass_marks: Some(80),
            exam_date: None,
            is_published: false,
        };
        assert!(exam.validate().is_err());
        let exam = CreateExam { pass_marks: Some(23), ..exam };
        assert!(exam.validate().is_ok());
    }
}
