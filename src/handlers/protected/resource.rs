// handlers/protected/resource.rs - Generic list/count/get/create/update/delete/restore
//
// Mounted once per entity, e.g. `resource::list::<College>` for GET /colleges.

use axum::extract::State;
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::Resource;
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult, Page, ValidJson};
use crate::models::{Creatable, Editable};
use crate::services::{CrudService, ListParams};
use crate::state::AppState;

/// GET /:resource - paginated list with search, parent filters and sorting
pub async fn list<T: Resource>(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<T>> {
    let params = ListParams::parse::<T>(&query)?;
    Ok(ApiResponse::success(CrudService::new(&state.db).list::<T>(&params).await?))
}

/// GET /:resource/count - same filters as list
pub async fn count<T: Resource>(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Value> {
    let params = ListParams::parse::<T>(&query)?;
    let count = CrudService::new(&state.db).count::<T>(&params).await?;
    Ok(ApiResponse::success(json!({ "count": count })))
}

/// GET /:resource/:id
pub async fn get<T: Resource>(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<T> {
    Ok(ApiResponse::success(CrudService::new(&state.db).get::<T>(id).await?))
}

/// POST /:resource
pub async fn create<T: Creatable>(State(state): State<AppState>, ValidJson(input): ValidJson<T::Create>) -> ApiResult<T> {
    Ok(ApiResponse::created(CrudService::new(&state.db).create::<T>(&input).await?))
}

/// PATCH /:resource/:id
pub async fn update<T: Editable>(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<T::Update>,
) -> ApiResult<T> {
    Ok(ApiResponse::success(CrudService::new(&state.db).update::<T>(id, &input).await?))
}

/// DELETE /:resource/:id - soft delete
pub async fn soft_delete<T: Resource>(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<T> {
    Ok(ApiResponse::success(CrudService::new(&state.db).soft_delete::<T>(id).await?))
}

/// POST /:resource/:id/restore
pub async fn restore<T: Resource>(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<T> {
    Ok(ApiResponse::success(CrudService::new(&state.db).restore::<T>(id).await?))
}

/// DELETE /:resource/:id/permanent - fails with 400 while other rows reference it
pub async fn hard_delete<T: Resource>(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<()> {
    CrudService::new(&state.db).hard_delete::<T>(id).await?;
    Ok(ApiResponse::no_content())
}
