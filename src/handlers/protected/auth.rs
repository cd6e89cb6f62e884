// handlers/protected/auth.rs - GET /api/v1/auth/me and PATCH /api/v1/auth/update-password

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::auth::{AuthService, UpdatePasswordRequest, UserProfile};
use crate::state::AppState;

pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(AuthService::new(&state.db).me(user.user_id).await?))
}

pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<UpdatePasswordRequest>,
) -> ApiResult<Value> {
    AuthService::new(&state.db).update_password(user.user_id, &request).await?;
    Ok(ApiResponse::success(json!({ "message": "Password updated successfully." })))
}
