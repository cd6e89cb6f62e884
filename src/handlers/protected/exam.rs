// handlers/protected/exam.rs - Exam creation and publishing

use axum::extract::State;
use uuid::Uuid;

use crate::middleware::{ApiPath, ApiResponse, ApiResult, ValidJson};
use crate::models::exam::CreateExam;
use crate::models::Exam;
use crate::services::exam::ExamService;
use crate::state::AppState;

/// POST /exams - revives a soft-deleted exam of the same semester and type
pub async fn create(State(state): State<AppState>, ValidJson(input): ValidJson<CreateExam>) -> ApiResult<Exam> {
    Ok(ApiResponse::created(ExamService::new(&state.db).create(&input).await?))
}

pub async fn publish(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Exam> {
    Ok(ApiResponse::success(ExamService::new(&state.db).set_published(id, true).await?))
}

pub async fn unpublish(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Exam> {
    Ok(ApiResponse::success(ExamService::new(&state.db).set_published(id, false).await?))
}
