// handlers/protected/student_records.rs - Internships and certificates
//
// One set of handlers, mounted for each StudentRecord type.

use axum::extract::State;
use std::collections::HashMap;
use uuid::Uuid;

use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, Page, ValidJson};
use crate::services::student_records::{StudentRecord, StudentRecordService};
use crate::services::ListParams;
use crate::state::AppState;

/// POST / - STUDENT, recorded against the caller's own profile
pub async fn create<T: StudentRecord>(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(input): ValidJson<<T as StudentRecord>::Create>,
) -> ApiResult<T> {
    Ok(ApiResponse::created(StudentRecordService::new(&state.db).create::<T>(&user, &input).await?))
}

/// GET /me
pub async fn mine<T: StudentRecord>(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<T>> {
    let params = ListParams::parse::<T>(&query)?;
    Ok(ApiResponse::success(StudentRecordService::new(&state.db).mine::<T>(&user, params).await?))
}

/// GET /student/:studentId - FACULTY, ADMIN
pub async fn for_student<T: StudentRecord>(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<HashMap<String, String>>,
) -> ApiResult<Page<T>> {
    let params = ListParams::parse::<T>(&query)?;
    Ok(ApiResponse::success(StudentRecordService::new(&state.db).for_student::<T>(student_id, params).await?))
}

pub async fn get<T: StudentRecord>(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> ApiResult<T> {
    Ok(ApiResponse::success(StudentRecordService::new(&state.db).get::<T>(&user, id).await?))
}

pub async fn update<T: StudentRecord>(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<T::Update>,
) -> ApiResult<T> {
    Ok(ApiResponse::success(StudentRecordService::new(&state.db).update::<T>(&user, id, &input).await?))
}

pub async fn delete<T: StudentRecord>(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<Uuid>) -> ApiResult<T> {
    Ok(ApiResponse::success(StudentRecordService::new(&state.db).delete::<T>(&user, id).await?))
}

/// GET /stats - FACULTY, ADMIN
pub async fn stats<T: StudentRecord>(State(state): State<AppState>) -> ApiResult<T::Stats> {
    Ok(ApiResponse::success(StudentRecordService::new(&state.db).stats::<T>().await?))
}
