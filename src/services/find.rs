use serde_json::Value;

use crate::database::{Database, Repository, Resource};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::models::*;

/// Resource names accepted by `POST /find/:resource`
pub const FINDABLE: &[&str] = &[
    "colleges",
    "academic-years",
    "departments",
    "semesters",
    "divisions",
    "subjects",
    "faculties",
    "students",
    "courses",
    "exams",
    "exam-results",
    "attendance",
    "assignments",
    "submissions",
    "internships",
    "certificates",
];

async fn select<T: Resource>(db: &Database, filter: FilterData) -> Result<Value, ApiError> {
    let rows = Repository::<T>::select(db.pool(), filter).await?;
    serde_json::to_value(rows).map_err(|e| ApiError::internal_server_error(e.to_string()))
}

/// Run a raw filter against the named resource
pub async fn find(db: &Database, resource: &str, filter: FilterData) -> Result<Value, ApiError> {
    tracing::debug!(resource, "Running find query");
    match resource {
        "colleges" => select::<College>(db, filter).await,
        "academic-years" => select::<AcademicYear>(db, filter).await,
        "departments" => select::<Department>(db, filter).await,
        "semesters" => select::<Semester>(db, filter).await,
        "divisions" => select::<Division>(db, filter).await,
        "subjects" => select::<Subject>(db, filter).await,
        "faculties" => select::<Faculty>(db, filter).await,
        "students" => select::<Student>(db, filter).await,
        "courses" => select::<Course>(db, filter).await,
        "exams" => select::<Exam>(db, filter).await,
        "exam-results" => select::<ExamResult>(db, filter).await,
        "attendance" => select::<Attendance>(db, filter).await,
        "assignments" => select::<Assignment>(db, filter).await,
        "submissions" => select::<Submission>(db, filter).await,
        "internships" => select::<Internship>(db, filter).await,
        "certificates" => select::<Certificate>(db, filter).await,
        other => Err(ApiError::not_found(format!("Unknown resource '{}'.", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_resources_are_not_found() {
        let db = Database::connect_lazy("postgres://trackademy@localhost:1/unused").unwrap();
        let err = find(&db, "widgets", FilterData::default()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn findable_names_are_unique() {
        let mut names = FINDABLE.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), FINDABLE.len());
    }
}
