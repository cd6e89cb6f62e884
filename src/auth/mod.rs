pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::models::Role;

pub use password::{check_policy, generate_random_password, hash_password, verify_password};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Authentication token is required.")]
    MissingToken,

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    WeakPassword(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// Token payload: the user id in `sub`, plus the email and role it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: Role) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self { sub: user_id, email: email.into(), role, iat: now.timestamp(), exp }
    }
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::TokenGeneration("JWT secret not configured".to_string()));
    }

    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Decode and verify an HS256 token, including its expiry
pub fn validate_jwt(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::InvalidToken("JWT secret not configured".to_string()));
    }

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Rejected JWT: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::InvalidToken("Token has expired. Please log in again.".to_string())
                }
                _ => AuthError::InvalidToken("Invalid authentication token.".to_string()),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip() {
        let user_id = Uuid::new_v4();
        let token = generate_jwt(&Claims::new(user_id, "hod.ce@ldrp.ac.in", Role::Faculty)).unwrap();
        let claims = validate_jwt(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Faculty);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), "student@ldrp.ac.in", Role::Student);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&claims).unwrap();
        match validate_jwt(&token) {
            Err(AuthError::InvalidToken(msg)) => assert!(msg.contains("expired")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(validate_jwt("not.a.token"), Err(AuthError::InvalidToken(_))));
    }
}
