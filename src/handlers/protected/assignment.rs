// handlers/protected/assignment.rs - Assignments (faculty) and submissions (students)

use axum::extract::State;
use std::collections::HashMap;
use uuid::Uuid;

use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, Page, ValidJson};
use crate::models::assignment::{AssignmentStatistics, CreateAssignment, UpdateAssignment};
use crate::models::submission::{CreateSubmission, GradeSubmission, UpdateSubmission};
use crate::models::{Assignment, Submission};
use crate::services::assignment::AssignmentService;
use crate::services::ListParams;
use crate::state::AppState;

/// GET /assignments - scoped by role
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<Assignment>> {
    let params = ListParams::parse::<Assignment>(&query)?;
    Ok(ApiResponse::success(AssignmentService::new(&state.db).list(&user, params).await?))
}

pub async fn get(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Assignment> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).get(&user, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<CreateAssignment>,
) -> ApiResult<Assignment> {
    Ok(ApiResponse::created(AssignmentService::new(&state.db).create(&user, &input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<UpdateAssignment>,
) -> ApiResult<Assignment> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).update(&user, id, &input).await?))
}

pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> ApiResult<Assignment> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).delete(&user, id).await?))
}

/// GET /assignments/:id/statistics
pub async fn statistics(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<AssignmentStatistics> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).statistics(&user, id).await?))
}

/// POST /submissions - flagged late after the due date
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<CreateSubmission>,
) -> ApiResult<Submission> {
    Ok(ApiResponse::created(AssignmentService::new(&state.db).submit(&user, &input).await?))
}

/// GET /submissions?assignmentId= - faculty of the course, or admin
pub async fn list_submissions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<Submission>> {
    let params = ListParams::parse::<Submission>(&query)?;
    Ok(ApiResponse::success(AssignmentService::new(&state.db).submissions_for(&user, params).await?))
}

/// GET /submissions/me
pub async fn my_submissions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<Submission>> {
    let params = ListParams::parse::<Submission>(&query)?;
    Ok(ApiResponse::success(AssignmentService::new(&state.db).my_submissions(&user, params).await?))
}

pub async fn get_submission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Submission> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).submission(&user, id).await?))
}

pub async fn update_submission(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<UpdateSubmission>,
) -> ApiResult<Submission> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).update_submission(&user, id, &input).await?))
}

pub async fn delete_submission(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    AssignmentService::new(&state.db).delete_submission(&user, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /submissions/:id/grade
pub async fn grade(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<GradeSubmission>,
) -> ApiResult<Submission> {
    Ok(ApiResponse::success(AssignmentService::new(&state.db).grade(&user, id, &input).await?))
}
