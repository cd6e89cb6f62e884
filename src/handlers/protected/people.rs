// handlers/protected/people.rs - Faculty and student accounts (ADMIN routes)

use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiPath, ApiResponse, ApiResult, ValidJson};
use crate::models::faculty::CreateFaculty;
use crate::models::student::CreateStudent;
use crate::models::{Faculty, Student};
use crate::services::people::PeopleService;
use crate::state::AppState;

/// POST /faculties and POST /auth/register/faculty
pub async fn create_faculty(State(state): State<AppState>, ValidJson(input): ValidJson<CreateFaculty>) -> ApiResult<Faculty> {
    Ok(ApiResponse::created(PeopleService::new(&state.db).create_faculty(&input).await?))
}

pub async fn create_student(State(state): State<AppState>, ValidJson(input): ValidJson<CreateStudent>) -> ApiResult<Student> {
    Ok(ApiResponse::created(PeopleService::new(&state.db).create_student(&input).await?))
}

/// GET /students/enrollment/:enrollmentNumber
pub async fn student_by_enrollment(
    State(state): State<AppState>,
    ApiPath(enrollment_number): ApiPath<String>,
) -> ApiResult<Student> {
    Ok(ApiResponse::success(PeopleService::new(&state.db).student_by_enrollment(&enrollment_number).await?))
}

/// DELETE /faculties/:id/permanent - removes the login account too
pub async fn hard_delete_faculty(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    PeopleService::new(&state.db).hard_delete_faculty(id).await?;
    Ok(ApiResponse::no_content())
}

pub async fn hard_delete_student(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    PeopleService::new(&state.db).hard_delete_student(id).await?;
    Ok(ApiResponse::no_content())
}
