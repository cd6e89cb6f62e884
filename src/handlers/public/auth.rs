// handlers/public/auth.rs - POST /api/v1/auth/login and bootstrap admin registration

use axum::{extract::State, http::HeaderMap};

use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::models::User;
use crate::services::auth::{AuthService, LoginRequest, LoginResponse, RegisterAdminRequest};
use crate::state::AppState;

/// POST /api/v1/auth/login - email or enrollment number plus password
pub async fn login(State(state): State<AppState>, ApiJson(request): ApiJson<LoginRequest>) -> ApiResult<LoginResponse> {
    let response = AuthService::new(&state.db).login(&request).await?;
    Ok(ApiResponse::success(response))
}

/// POST /api/v1/auth/register/admin - ADMIN only, except while no admin exists yet
pub async fn register_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<RegisterAdminRequest>,
) -> ApiResult<User> {
    let caller = AuthUser::from_headers(&headers).ok();
    let user = AuthService::new(&state.db).register_admin_as(&request, caller.as_ref()).await?;
    Ok(ApiResponse::created(user))
}
