use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::{self, generate_jwt, hash_password, verify_password, AuthError, Claims};
use crate::database::{Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::middleware::{AuthUser, ADMIN_ONLY};
use crate::models::validate::{is_email, Validator};
use crate::models::{Designation, Role, Student, User};
use crate::services::people::{insert_user, normalize_email};

/// Serializes admin bootstrap registrations
const ADMIN_BOOTSTRAP_LOCK: i64 = 0x7472_6163_6b61;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address, or a student's enrollment number
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAdminRequest {
    pub email: String,
    pub password: String,
}

/// Account summary returned by login and `/auth/me`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<Designation>,
    /// Faculty or student row linked to the account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    full_name: String,
}

#[derive(FromRow)]
struct FacultyProfileRow {
    id: Uuid,
    full_name: String,
    designation: Designation,
}

pub struct AuthService<'a> {
    db: &'a Database,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let identifier = request.identifier.trim();
        if identifier.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = if is_email(identifier) {
            self.user_by_email(identifier).await?
        } else {
            match Repository::<Student>::find_by(self.db.pool(), json!({ "enrollment_number": identifier })).await? {
                Some(student) => Repository::<User>::find(self.db.pool(), student.user_id).await?,
                None => None,
            }
        };

        let user = user.ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(&request.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = generate_jwt(&Claims::new(user.id, user.email.clone(), user.role))?;
        let profile = self.profile(&user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(LoginResponse { token, user: profile })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<UserProfile, ApiError> {
        let user = Repository::<User>::find(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found."))?;
        self.profile(&user).await
    }

    pub async fn update_password(&self, user_id: Uuid, request: &UpdatePasswordRequest) -> Result<(), ApiError> {
        auth::check_policy(&request.new_password).map_err(AuthError::WeakPassword)?;
        let user = Repository::<User>::find(self.db.pool(), user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found."))?;
        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(ApiError::unauthorized("Current password is incorrect."));
        }
        self.store_password(user.id, &request.new_password).await?;
        tracing::info!(%user_id, "Password updated");
        Ok(())
    }

    pub async fn reset_password(&self, user_id: Uuid, request: &ResetPasswordRequest) -> Result<(), ApiError> {
        auth::check_policy(&request.new_password).map_err(AuthError::WeakPassword)?;
        if Repository::<User>::find(self.db.pool(), user_id).await?.is_none() {
            return Err(ApiError::not_found("User not found."));
        }
        self.store_password(user_id, &request.new_password).await?;
        tracing::warn!(%user_id, "Password reset by administrator");
        Ok(())
    }

    /// Unconditional; for operators with database access
    pub async fn register_admin(&self, request: &RegisterAdminRequest) -> Result<User, ApiError> {
        let password_hash = admin_password_hash(request)?;
        let mut tx = self.db.pool().begin().await?;
        let user = insert_user(&mut tx, &request.email, password_hash, Role::Admin).await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id, "Registered administrator");
        Ok(user)
    }

    /// Open to anyone while no administrator exists, ADMIN only afterwards.
    /// The count and the insert share one transaction under an advisory lock
    /// so concurrent bootstrap requests cannot both succeed.
    pub async fn register_admin_as(
        &self,
        request: &RegisterAdminRequest,
        caller: Option<&AuthUser>,
    ) -> Result<User, ApiError> {
        let mut tx = self.db.pool().begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(ADMIN_BOOTSTRAP_LOCK).execute(&mut *tx).await?;
        let admins: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'ADMIN'").fetch_one(&mut *tx).await?;
        if admins == 0 {
            tracing::warn!("No admin account exists; accepting bootstrap registration");
        } else {
            let caller = caller.ok_or(AuthError::MissingToken)?;
            caller.require(ADMIN_ONLY)?;
        }

        let password_hash = admin_password_hash(request)?;
        let user = insert_user(&mut tx, &request.email, password_hash, Role::Admin).await?;
        tx.commit().await?;
        tracing::info!(user_id = %user.id, bootstrap = admins == 0, "Registered administrator");
        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(Repository::<User>::find_by(self.db.pool(), json!({ "email": normalize_email(email) })).await?)
    }

    async fn store_password(&self, user_id: Uuid, password: &str) -> Result<(), ApiError> {
        let hash = hash_password(password)?;
        Repository::<User>::update(self.db.pool(), user_id, vec![("password_hash", SqlValue::Text(hash))]).await?;
        Ok(())
    }

    async fn profile(&self, user: &User) -> Result<UserProfile, ApiError> {
        let mut profile = UserProfile {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            full_name: "Administrator".to_string(),
            designation: None,
            profile_id: None,
        };

        match user.role {
            Role::Admin => {}
            Role::Faculty => {
                let row: Option<FacultyProfileRow> = sqlx::query_as(
                    "SELECT id, full_name, designation FROM faculties WHERE user_id = $1 AND is_deleted = false",
                )
                .bind(user.id)
                .fetch_optional(self.db.pool())
                .await?;
                if let Some(row) = row {
                    profile.full_name = row.full_name;
                    profile.designation = Some(row.designation);
                    profile.profile_id = Some(row.id);
                }
            }
            Role::Student => {
                let row: Option<ProfileRow> =
                    sqlx::query_as("SELECT id, full_name FROM students WHERE user_id = $1 AND is_deleted = false")
                        .bind(user.id)
                        .fetch_optional(self.db.pool())
                        .await?;
                if let Some(row) = row {
                    profile.full_name = row.full_name;
                    profile.profile_id = Some(row.id);
                }
            }
        }
        Ok(profile)
    }
}

fn admin_password_hash(request: &RegisterAdminRequest) -> Result<String, ApiError> {
    let mut v = Validator::new();
    v.email("email", &request.email);
    if let Err(message) = auth::check_policy(&request.password) {
        v.check(false, "password", message);
    }
    v.finish()?;
    Ok(hash_password(&request.password)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_admin_passwords_fail_before_hashing() {
        let request = RegisterAdminRequest { email: "not-an-email".into(), password: "short".into() };
        let err = admin_password_hash(&request).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn profile_omits_missing_designation() {
        let profile = UserProfile {
            id: Uuid::nil(),
            email: "admin@trackademy.local".into(),
            role: Role::Admin,
            full_name: "Administrator".into(),
            designation: None,
            profile_id: None,
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["fullName"], "Administrator");
        assert_eq!(value["role"], "ADMIN");
        assert!(value.get("designation").is_none());
    }

    #[test]
    fn login_request_uses_camel_case() {
        let request: UpdatePasswordRequest =
            serde_json::from_value(json!({ "currentPassword": "a", "newPassword": "b" })).unwrap();
        assert_eq!(request.new_password, "b");
    }
}
