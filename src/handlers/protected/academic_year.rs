// handlers/protected/academic_year.rs - Academic year writes and activation

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult, ValidJson};
use crate::models::academic_year::{CreateAcademicYear, UpdateAcademicYear};
use crate::models::AcademicYear;
use crate::services::academic_year::AcademicYearService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveQuery {
    pub college_id: Option<Uuid>,
}

pub async fn create(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<CreateAcademicYear>,
) -> ApiResult<AcademicYear> {
    Ok(ApiResponse::created(AcademicYearService::new(&state.db).create(&input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<UpdateAcademicYear>,
) -> ApiResult<AcademicYear> {
    Ok(ApiResponse::success(AcademicYearService::new(&state.db).update(id, &input).await?))
}

/// GET /academic-years/active?collegeId=
pub async fn active(State(state): State<AppState>, ApiQuery(query): ApiQuery<ActiveQuery>) -> ApiResult<AcademicYear> {
    Ok(ApiResponse::success(AcademicYearService::new(&state.db).active(query.college_id).await?))
}

/// POST /academic-years/:id/activate - every other year of the college is deactivated
pub async fn activate(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<AcademicYear> {
    Ok(ApiResponse::success(AcademicYearService::new(&state.db).activate(id).await?))
}

pub async fn deactivate(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<AcademicYear> {
    Ok(ApiResponse::success(AcademicYearService::new(&state.db).deactivate(id).await?))
}
