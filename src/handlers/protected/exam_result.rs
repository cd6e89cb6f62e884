// handlers/protected/exam_result.rs - Exam results, their subject grades and statistics

use axum::extract::State;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, Page, ValidJson};
use crate::models::exam_result::{CreateExamResult, ExamResultDetail, UpdateExamResult};
use crate::models::{ExamResult, Role};
use crate::services::exam_result::{ExamResultService, ExamResultSummary, ResultFilters, ResultStatistics};
use crate::services::people::PeopleService;
use crate::services::ListParams;
use crate::state::AppState;

/// Students are pinned to their own results whatever they ask for
async fn scoped_filters(state: &AppState, user: &AuthUser, query: &HashMap<String, String>) -> Result<ResultFilters, ApiError> {
    let mut filters = ResultFilters::parse(query)?;
    if user.is(Role::Student) {
        let student = PeopleService::new(&state.db).current_student(user).await?;
        filters.student_id = Some(student.id);
    }
    Ok(filters)
}

/// GET /exam-results
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<ExamResultSummary>> {
    let filters = scoped_filters(&state, &user, &query).await?;
    let params = ListParams::paging::<ExamResult>(&query)?;
    Ok(ApiResponse::success(ExamResultService::new(&state.db).list(&filters, &params).await?))
}

/// GET /exam-results/:id - includes subject grades
pub async fn get(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> ApiResult<ExamResultDetail> {
    let detail = ExamResultService::new(&state.db).get(id).await?;
    if user.is(Role::Student) {
        let student = PeopleService::new(&state.db).current_student(&user).await?;
        if detail.result.student_id != Some(student.id) {
            return Err(ApiError::permission_denied());
        }
    }
    Ok(ApiResponse::success(detail))
}

pub async fn create(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateExamResult>,
) -> ApiResult<ExamResultDetail> {
    Ok(ApiResponse::created(ExamResultService::new(&state.db).create(&input).await?))
}

/// PATCH /exam-results/:id - `results` replaces every subject grade
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<UpdateExamResult>,
) -> ApiResult<ExamResultDetail> {
    Ok(ApiResponse::success(ExamResultService::new(&state.db).update(id, &input).await?))
}

pub async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    ExamResultService::new(&state.db).delete(id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /exam-results/statistics and GET /analytics/results
pub async fn statistics(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<ResultStatistics> {
    let filters = scoped_filters(&state, &user, &query).await?;
    Ok(ApiResponse::success(ExamResultService::new(&state.db).statistics(&filters).await?))
}
