use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{validate_jwt, AuthError, Claims};
use crate::error::ApiError;
use crate::models::Role;

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const STAFF: &[Role] = &[Role::Admin, Role::Faculty];
pub const FACULTY_ONLY: &[Role] = &[Role::Faculty];
pub const STUDENT_ONLY: &[Role] = &[Role::Student];

/// Authenticated caller, taken from a verified JWT or the service API key
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.sub, email: claims.email, role: claims.role }
    }
}

impl AuthUser {
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn require(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ApiError::permission_denied())
        }
    }

    /// Bearer token from the Authorization header, when one is sent
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let token = extract_jwt_from_headers(headers)?;
        validate_jwt(&token).map(AuthUser::from)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

/// JWT authentication middleware that validates tokens and injects [`AuthUser`]
pub async fn jwt_auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = AuthUser::from_headers(&headers)?;
    tracing::debug!(user_id = %auth_user.user_id, role = %auth_user.role, "authenticated request");
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Route guard: `route_layer(from_fn_with_state(ADMIN_ONLY, require_roles))`
pub async fn require_roles(
    State(roles): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request.extensions().get::<AuthUser>().ok_or(AuthError::MissingToken)?;
    auth_user.require(roles)?;
    Ok(next.run(request).await)
}

fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AuthError::MissingToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_required() {
        let mut headers = HeaderMap::new();
        assert!(matches!(AuthUser::from_headers(&headers), Err(AuthError::MissingToken)));
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(matches!(AuthUser::from_headers(&headers), Err(AuthError::MissingToken)));
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(matches!(AuthUser::from_headers(&headers), Err(AuthError::MissingToken)));
    }

    #[test]
    fn valid_token_yields_user() {
        let user_id = Uuid::new_v4();
        let token = generate_jwt(&Claims::new(user_id, "admin@ldrp.ac.in", Role::Admin)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());
        let user = AuthUser::from_headers(&headers).unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(user.require(&[Role::Admin]).is_ok());
        assert!(user.require(&[Role::Faculty, Role::Student]).is_err());
    }
}
