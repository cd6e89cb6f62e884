use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use sqlx::FromRow;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::value::{bind_query_as, bind_query_scalar};
use crate::database::{Changes, Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::middleware::Page;
use crate::models::exam_result::{CreateExamResult, ExamResultDetail, SubjectGrade, UpdateExamResult};
use crate::models::{Changeset, Exam, ExamResult, ResultStatus, Student, SubjectResult};
use crate::services::crud::ListParams;

const RESULT_JOINS: &str = "FROM exam_results r \
     JOIN exams e ON e.id = r.exam_id \
     JOIN semesters sem ON sem.id = e.semester_id \
     JOIN departments d ON d.id = sem.department_id \
     JOIN academic_years ay ON ay.id = sem.academic_year_id \
     LEFT JOIN students s ON s.id = r.student_id";

/// Filters accepted by result listings and statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFilters {
    pub exam_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub status: Option<ResultStatus>,
    pub semester_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub academic_year_id: Option<Uuid>,
    pub min_spi: Option<Decimal>,
    pub max_spi: Option<Decimal>,
    pub min_cpi: Option<Decimal>,
    pub max_cpi: Option<Decimal>,
    pub search: Option<String>,
}

impl ResultFilters {
    pub fn parse(query: &HashMap<String, String>) -> Result<Self, ApiError> {
        Ok(Self {
            exam_id: parse_param(query, "examId")?,
            student_id: parse_param(query, "studentId")?,
            status: parse_param(query, "status")?,
            semester_id: parse_param(query, "semesterId")?,
            department_id: parse_param(query, "departmentId")?,
            academic_year_id: parse_param(query, "academicYearId")?,
            min_spi: parse_param(query, "minSpi")?,
            max_spi: parse_param(query, "maxSpi")?,
            min_cpi: parse_param(query, "minCpi")?,
            max_cpi: parse_param(query, "maxCpi")?,
            search: query.get("search").map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        })
    }

    /// WHERE clause over [`RESULT_JOINS`] and its bind parameters
    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();
        let mut push = |template: &str, value: SqlValue| {
            let placeholder = value.placeholder(params.len() + 1);
            clauses.push(template.replace("{}", &placeholder));
            params.push(value);
        };

        if let Some(id) = self.exam_id {
            push("r.exam_id = {}", SqlValue::Uuid(id));
        }
        if let Some(id) = self.student_id {
            push("r.student_id = {}", SqlValue::Uuid(id));
        }
        if let Some(status) = self.status {
            push("r.status = {}", status.to_sql());
        }
        if let Some(id) = self.semester_id {
            push("e.semester_id = {}", SqlValue::Uuid(id));
        }
        if let Some(id) = self.department_id {
            push("sem.department_id = {}", SqlValue::Uuid(id));
        }
        if let Some(id) = self.academic_year_id {
            push("sem.academic_year_id = {}", SqlValue::Uuid(id));
        }
        for (template, bound) in [
            ("r.spi >= {}", self.min_spi),
            ("r.spi <= {}", self.max_spi),
            ("r.cpi >= {}", self.min_cpi),
            ("r.cpi <= {}", self.max_cpi),
        ] {
            if let Some(bound) = bound {
                push(template, SqlValue::Decimal(bound));
            }
        }
        if let Some(term) = &self.search {
            push(
                "(r.student_enrollment_number ILIKE {} OR s.full_name ILIKE {})",
                SqlValue::Text(format!("%{}%", term)),
            );
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }
}

fn parse_param<T: FromStr>(query: &HashMap<String, String>, key: &str) -> Result<Option<T>, ApiError> {
    match query.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid value for {}: '{}'.", key, raw))),
    }
}

/// Result row with the exam, semester and student context a listing shows
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub result: ExamResult,
    pub student_name: Option<String>,
    pub exam_name: String,
    pub exam_type: crate::models::ExamType,
    pub semester_number: i32,
    pub department_abbreviation: String,
    pub academic_year: String,
    pub subject_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStatistics {
    pub total_results: i64,
    pub pass_count: i64,
    pub fail_count: i64,
    pub pass_percentage: f64,
    pub fail_percentage: f64,
    pub average_spi: f64,
    pub average_cpi: f64,
    pub top_spi_result: Option<ExamResultSummary>,
    pub top_cpi_result: Option<ExamResultSummary>,
}

#[derive(FromRow)]
struct Aggregates {
    total: i64,
    pass_count: i64,
    fail_count: i64,
    average_spi: Option<Decimal>,
    average_cpi: Option<Decimal>,
}

/// Share of `part` in `total` as a percentage with two decimals
pub fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 10000.0 / total as f64).round() / 100.0
}

fn two_places(value: Option<Decimal>) -> f64 {
    value
        .map(|v| v.round_dp(2))
        .and_then(|v| v.to_string().parse::<f64>().ok())
        .unwrap_or(0.0)
}

pub struct ExamResultService<'a> {
    db: &'a Database,
}

impl<'a> ExamResultService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &CreateExamResult) -> Result<ExamResultDetail, ApiError> {
        if Repository::<Exam>::find(self.db.pool(), input.exam_id).await?.is_none() {
            return Err(ApiError::bad_request("Exam not found."));
        }
        let enrollment_number = input.student_enrollment_number.trim();
        if let Some(student_id) = input.student_id {
            let student = Repository::<Student>::find(self.db.pool(), student_id)
                .await?
                .ok_or_else(|| ApiError::bad_request("Student not found."))?;
            if student.enrollment_number != enrollment_number {
                return Err(ApiError::bad_request("Student enrollment number mismatch."));
            }
        }

        let existing = Repository::<ExamResult>::find_by(
            self.db.pool(),
            json!({ "exam_id": input.exam_id.to_string(), "student_enrollment_number": enrollment_number }),
        )
        .await?;
        if existing.is_some() {
            return Err(ApiError::conflict(format!(
                "Exam result already exists for student {} in this exam.",
                enrollment_number
            )));
        }

        let mut tx = self.db.pool().begin().await?;
        let result = Repository::<ExamResult>::insert(&mut *tx, input.changes()).await?;
        let results = insert_grades(&mut tx, result.id, &input.results).await?;
        tx.commit().await?;

        tracing::info!(exam_result_id = %result.id, enrollment = enrollment_number, "Created exam result");
        Ok(ExamResultDetail { result, results })
    }

    pub async fn list(&self, filters: &ResultFilters, params: &ListParams) -> Result<Page<ExamResultSummary>, ApiError> {
        let (where_sql, mut bind) = filters.to_sql();

        let count_sql = format!("SELECT COUNT(*) {}{}", RESULT_JOINS, where_sql);
        let total: i64 = bind_query_scalar(sqlx::query_scalar(&count_sql), bind.clone())
            .fetch_one(self.db.pool())
            .await?;

        let limit_at = bind.len() + 1;
        bind.push(SqlValue::BigInt(params.limit));
        bind.push(SqlValue::BigInt(params.offset()));
        let sql = format!(
            "{} {}{} ORDER BY ay.year DESC, sem.semester_number ASC, r.student_enrollment_number ASC LIMIT ${} OFFSET ${}",
            summary_select(),
            RESULT_JOINS,
            where_sql,
            limit_at,
            limit_at + 1
        );
        let items = bind_query_as(sqlx::query_as::<_, ExamResultSummary>(&sql), bind)
            .fetch_all(self.db.pool())
            .await?;
        Ok(Page::new(items, params.page, params.limit, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<ExamResultDetail, ApiError> {
        let result = Repository::<ExamResult>::get(self.db.pool(), id).await?;
        let results = self.grades(id).await?;
        Ok(ExamResultDetail { result, results })
    }

    pub async fn update(&self, id: Uuid, input: &UpdateExamResult) -> Result<ExamResultDetail, ApiError> {
        let changes: Changes = input.changes();
        if changes.is_empty() && input.results.is_none() {
            return Err(ApiError::bad_request("At least one field must be provided for update."));
        }

        let mut tx = self.db.pool().begin().await?;
        let result = if changes.is_empty() {
            Repository::<ExamResult>::get(&mut *tx, id).await?
        } else {
            Repository::<ExamResult>::update(&mut *tx, id, changes).await?
        };
        if let Some(grades) = &input.results {
            sqlx::query("DELETE FROM subject_results WHERE exam_result_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_grades(&mut tx, id, grades).await?;
        }
        tx.commit().await?;

        let results = self.grades(id).await?;
        Ok(ExamResultDetail { result, results })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        Repository::<ExamResult>::hard_delete(self.db.pool(), id).await?;
        tracing::warn!(exam_result_id = %id, "Deleted exam result");
        Ok(())
    }

    pub async fn statistics(&self, filters: &ResultFilters) -> Result<ResultStatistics, ApiError> {
        let (where_sql, bind) = filters.to_sql();
        let sql = format!(
            "SELECT COUNT(*) AS total, \
                    COUNT(*) FILTER (WHERE r.status = 'PASS') AS pass_count, \
                    COUNT(*) FILTER (WHERE r.status = 'FAIL') AS fail_count, \
                    AVG(r.spi) AS average_spi, AVG(r.cpi) AS average_cpi {}{}",
            RESULT_JOINS, where_sql
        );
        let agg = bind_query_as(sqlx::query_as::<_, Aggregates>(&sql), bind).fetch_one(self.db.pool()).await?;

        let top_spi_result = self.top_by(filters, "r.spi").await?;
        let top_cpi_result = self.top_by(filters, "r.cpi").await?;

        Ok(ResultStatistics {
            total_results: agg.total,
            pass_count: agg.pass_count,
            fail_count: agg.fail_count,
            pass_percentage: percentage(agg.pass_count, agg.total),
            fail_percentage: percentage(agg.fail_count, agg.total),
            average_spi: two_places(agg.average_spi),
            average_cpi: two_places(agg.average_cpi),
            top_spi_result,
            top_cpi_result,
        })
    }

    async fn top_by(&self, filters: &ResultFilters, column: &str) -> Result<Option<ExamResultSummary>, ApiError> {
        let (where_sql, bind) = filters.to_sql();
        let sql = format!("{} {}{} ORDER BY {} DESC, r.created_at ASC LIMIT 1", summary_select(), RESULT_JOINS, where_sql, column);
        Ok(bind_query_as(sqlx::query_as::<_, ExamResultSummary>(&sql), bind)
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn grades(&self, exam_result_id: Uuid) -> Result<Vec<SubjectResult>, ApiError> {
        Ok(sqlx::query_as::<_, SubjectResult>(
            "SELECT sr.* FROM subject_results sr JOIN subjects sub ON sub.id = sr.subject_id \
             WHERE sr.exam_result_id = $1 ORDER BY sub.code",
        )
        .bind(exam_result_id)
        .fetch_all(self.db.pool())
        .await?)
    }
}

fn summary_select() -> &'static str {
    "SELECT r.*, s.full_name AS student_name, e.name AS exam_name, e.exam_type, \
            sem.semester_number, d.abbreviation AS department_abbreviation, ay.year AS academic_year, \
            (SELECT COUNT(*) FROM subject_results sr WHERE sr.exam_result_id = r.id) AS subject_count"
}

pub async fn insert_grades(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    exam_result_id: Uuid,
    grades: &[SubjectGrade],
) -> Result<Vec<SubjectResult>, ApiError> {
    let mut results = Vec::with_capacity(grades.len());
    for grade in grades {
        let changes = vec![
            ("exam_result_id", SqlValue::Uuid(exam_result_id)),
            ("subject_id", SqlValue::Uuid(grade.subject_id)),
            ("grade", SqlValue::text(grade.grade.trim())),
        ];
        results.push(Repository::<SubjectResult>::insert(&mut **tx, changes).await?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn filters_number_placeholders_in_order() {
        let exam_id = Uuid::new_v4();
        let filters = ResultFilters::parse(&query(&[
            ("examId", &exam_id.to_string()),
            ("status", "PASS"),
            ("minSpi", "7.5"),
            ("search", "22BE"),
        ]))
        .unwrap();
        let (sql, params) = filters.to_sql();
        assert_eq!(
            sql,
            " WHERE r.exam_id = $1 AND r.status = $2::result_status AND r.spi >= $3 \
             AND (r.student_enrollment_number ILIKE $4 OR s.full_name ILIKE $4)"
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[3], SqlValue::Text("%22BE%".into()));
    }

    #[test]
    fn empty_filters_have_no_where_clause() {
        let (sql, params) = ResultFilters::default().to_sql();
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn bad_filter_values_are_rejected() {
        assert!(ResultFilters::parse(&query(&[("status", "MAYBE")])).is_err());
        assert!(ResultFilters::parse(&query(&[("minCpi", "high")])).is_err());
        assert!(ResultFilters::parse(&query(&[("examId", "42")])).is_err());
    }

    #[test]
    fn percentages_round_to_two_places() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(two_places(Some(Decimal::new(81234, 4))), 8.12);
        assert_eq!(two_places(None), 0.0);
    }
}
