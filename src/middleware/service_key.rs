use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use uuid::Uuid;

use super::AuthUser;
use crate::config;
use crate::error::ApiError;
use crate::models::Role;

pub const SERVICE_KEY_HEADER: &str = "x-api-key";

/// Guards machine-to-machine routes with the shared `SERVICE_API_KEY`
pub async fn service_key_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(expected) = config::config().security.service_api_key.as_deref() else {
        tracing::error!("SERVICE_API_KEY is not configured; rejecting service request");
        return Err(ApiError::service_unavailable("Service authentication is not configured."));
    };

    let provided = headers.get(SERVICE_KEY_HEADER).and_then(|v| v.to_str().ok());
    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => {
            request.extensions_mut().insert(AuthUser {
                user_id: Uuid::nil(),
                email: "service@trackademy.internal".to_string(),
                role: Role::Admin,
            });
            Ok(next.run(request).await)
        }
        Some(_) => Err(ApiError::unauthorized("Invalid service API key.")),
        None => Err(ApiError::unauthorized("Service API key is required.")),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_keys_exactly() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret2"));
    }
}
