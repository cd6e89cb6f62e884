// handlers/protected/course.rs - POST /courses/:id/enroll

use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::models::course::EnrollStudents;
use crate::services::course::{CourseService, EnrollmentOutcome};
use crate::state::AppState;

pub async fn enroll(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<EnrollStudents>,
) -> ApiResult<EnrollmentOutcome> {
    Ok(ApiResponse::success(CourseService::new(&state.db).enroll(id, &input.student_ids).await?))
}
