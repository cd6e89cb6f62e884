// handlers/protected/dashboard.rs - GET /api/v1/dashboard/summary

use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult};
use crate::services::dashboard::{self, DashboardSummary};
use crate::state::AppState;

pub async fn summary(State(state): State<AppState>) -> ApiResult<DashboardSummary> {
    Ok(ApiResponse::success(dashboard::summary(&state.db).await?))
}
