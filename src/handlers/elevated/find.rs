// handlers/elevated/find.rs - POST /api/v1/find/:resource

use axum::extract::State;
use serde_json::Value;

use crate::filter::FilterData;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::find;
use crate::state::AppState;

/// Run a raw filter document against a resource catalog
pub async fn find_post(
    State(state): State<AppState>,
    ApiPath(resource): ApiPath<String>,
    ApiJson(filter): ApiJson<FilterData>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(find::find(&state.db, &resource, filter).await?))
}
