use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::ResultStatus;
use super::validate::Validator;
use super::Changeset;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

/// One student's outcome in an exam. Rows are hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: Option<Uuid>,
    pub student_enrollment_number: String,
    pub spi: Decimal,
    pub cpi: Decimal,
    pub status: ResultStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for ExamResult {
    const TABLE: &'static str = "exam_results";
    const NAME: &'static str = "Exam result";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("exam_id", ColumnKind::Uuid),
        col("student_id", ColumnKind::Uuid),
        col("student_enrollment_number", ColumnKind::Text),
        col("spi", ColumnKind::Decimal),
        col("cpi", ColumnKind::Decimal),
        col("status", ResultStatus::KIND),
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["student_enrollment_number"];
    const SORTABLE: &'static [&'static str] = &["spi", "cpi", "student_enrollment_number", "created_at"];
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubjectResult {
    pub id: Uuid,
    pub exam_result_id: Uuid,
    pub subject_id: Uuid,
    pub grade: String,
}

impl Resource for SubjectResult {
    const TABLE: &'static str = "subject_results";
    const NAME: &'static str = "Subject result";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("exam_result_id", ColumnKind::Uuid),
        col("subject_id", ColumnKind::Uuid),
        col("grade", ColumnKind::Text),
    ];
    const SORTABLE: &'static [&'static str] = &["grade"];
    const DEFAULT_ORDER: &'static str = "grade asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[("examResultId", "exam_result_id")];
}

/// Exam result with its per-subject grades
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultDetail {
    #[serde(flatten)]
    pub result: ExamResult,
    pub results: Vec<SubjectResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectGrade {
    pub subject_id: Uuid,
    pub grade: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExamResult {
    pub exam_id: Uuid,
    pub student_id: Option<Uuid>,
    pub student_enrollment_number: String,
    pub spi: Decimal,
    pub cpi: Decimal,
    pub status: ResultStatus,
    #[serde(default)]
    pub results: Vec<SubjectGrade>,
}

/// `results`, when present, replaces every subject grade of the result.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExamResult {
    pub spi: Option<Decimal>,
    pub cpi: Option<Decimal>,
    pub status: Option<ResultStatus>,
    pub results: Option<Vec<SubjectGrade>>,
}

fn check_index(v: &mut Validator, field: &str, value: Decimal) {
    v.range(field, value, Decimal::ZERO, Decimal::TEN);
}

fn check_grades(v: &mut Validator, grades: &[SubjectGrade]) {
    for grade in grades {
        v.length("results", &grade.grade, 1, 20);
    }
}

impl Changeset for CreateExamResult {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("studentEnrollmentNumber", &self.student_enrollment_number, 1, 50);
        check_index(&mut v, "spi", self.spi);
        check_index(&mut v, "cpi", self.cpi);
        check_grades(&mut v, &self.results);
        v.finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("exam_id", SqlValue::Uuid(self.exam_id)),
            ("student_id", SqlValue::opt_uuid(self.student_id)),
            ("student_enrollment_number", SqlValue::text(self.student_enrollment_number.trim())),
            ("spi", SqlValue::Decimal(self.spi.round_dp(2))),
            ("cpi", SqlValue::Decimal(self.cpi.round_dp(2))),
            ("status", self.status.to_sql()),
        ]
    }
}

impl Changeset for UpdateExamResult {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(spi) = self.spi {
            check_index(&mut v, "spi", spi);
        }
        if let Some(cpi) = self.cpi {
            check_index(&mut v, "cpi", cpi);
        }
        if let Some(grades) = &self.results {
            check_grades(&mut v, grades);
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(spi) = self.spi {
            changes.push(("spi", SqlValue::Decimal(spi.round_dp(2))));
        }
        if let Some(cpi) = self.cpi {
            changes.push(("cpi", SqlValue::Decimal(cpi.round_dp(2))));
        }
        if let Some(status) = self.status {
            changes.push(("status", status.to_sql()));
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn indices_are_bounded() {
        let input: CreateExamResult = serde_json::from_value(json!({
            "examId": Uuid::new_v4(),
            "studentEnrollmentNumber": "22CE041",
            "spi": 10.5,
            "cpi": 8.25,
            "status": "PASS",
        }))
        .unwrap();
        assert!(input.validate().is_err());
        assert!(input.results.is_empty());
    }

    #[test]
    fn detail_flattens_the_result() {
        let result = ExamResult {
            id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            student_id: None,
            student_enrollment_number: "22CE041".into(),
            spi: Decimal::new(825, 2),
            cpi: Decimal::new(790, 2),
            status: ResultStatus::Pass,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(ExamResultDetail { result, results: vec![] }).unwrap();
        assert_eq!(json["studentEnrollmentNumber"], "22CE041");
        assert_eq!(json["spi"], 8.25);
        assert!(json["results"].as_array().unwrap().is_empty());
    }
}
