use serde::Serialize;
use sqlx::FromRow;

use crate::database::Database;
use crate::error::ApiError;

/// Live record counts shown on the dashboard
#[derive(Debug, Clone, Default, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub colleges: i64,
    pub departments: i64,
    pub academic_years: i64,
    pub semesters: i64,
    pub divisions: i64,
    pub subjects: i64,
    pub faculties: i64,
    pub students: i64,
    pub courses: i64,
    pub exams: i64,
    pub exam_results: i64,
    pub attendance_records: i64,
}

const SOFT_DELETED_TABLES: &[(&str, &str)] = &[
    ("colleges", "colleges"),
    ("departments", "departments"),
    ("academic_years", "academic_years"),
    ("semesters", "semesters"),
    ("divisions", "divisions"),
    ("subjects", "subjects"),
    ("faculties", "faculties"),
    ("students", "students"),
    ("courses", "courses"),
    ("exams", "exams"),
];

fn summary_sql() -> String {
    let mut columns: Vec<String> = SOFT_DELETED_TABLES
        .iter()
        .map(|(table, alias)| format!("(SELECT COUNT(*) FROM {} WHERE is_deleted = false) AS {}", table, alias))
        .collect();
    columns.push("(SELECT COUNT(*) FROM exam_results) AS exam_results".to_string());
    columns.push("(SELECT COUNT(*) FROM attendances) AS attendance_records".to_string());
    format!("SELECT {}", columns.join(", "))
}

pub async fn summary(db: &Database) -> Result<DashboardSummary, ApiError> {
    Ok(sqlx::query_as::<_, DashboardSummary>(&summary_sql()).fetch_one(db.pool()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_every_table_once() {
        let sql = summary_sql();
        assert_eq!(sql.matches("COUNT(*)").count(), 12);
        assert!(sql.contains("FROM faculties WHERE is_deleted = false) AS faculties"));
        assert!(sql.ends_with("(SELECT COUNT(*) FROM attendances) AS attendance_records"));
    }
}
