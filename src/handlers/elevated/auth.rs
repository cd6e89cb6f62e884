// handlers/elevated/auth.rs - PATCH /api/v1/auth/users/:userId/reset-password

use axum::extract::State;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::auth::{AuthService, ResetPasswordRequest};
use crate::state::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    admin: AuthUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> ApiResult<Value> {
    AuthService::new(&state.db).reset_password(user_id, &request).await?;
    tracing::info!(%user_id, admin_id = %admin.user_id, "Password reset by admin");
    Ok(ApiResponse::success(json!({ "message": "Password reset successfully." })))
}
