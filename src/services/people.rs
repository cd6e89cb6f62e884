use serde_json::json;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::database::{Changes, Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::faculty::CreateFaculty;
use crate::models::student::CreateStudent;
use crate::models::{Changeset, Faculty, Role, Student, User};

/// Faculty and student profiles, each tied to a login account
pub struct PeopleService<'a> {
    db: &'a Database,
}

impl<'a> PeopleService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create_faculty(&self, input: &CreateFaculty) -> Result<Faculty, ApiError> {
        let password_hash = hash_password(&input.password)?;
        let mut tx = self.db.pool().begin().await?;
        let user = insert_user(&mut tx, &input.email, password_hash, Role::Faculty).await?;
        let faculty = insert_profile::<Faculty>(&mut tx, user.id, input.changes()).await?;
        tx.commit().await?;

        tracing::info!(faculty_id = %faculty.id, user_id = %user.id, "Created faculty account");
        Ok(faculty)
    }

    pub async fn create_student(&self, input: &CreateStudent) -> Result<Student, ApiError> {
        let password_hash = hash_password(&input.password)?;
        let mut tx = self.db.pool().begin().await?;
        let user = insert_user(&mut tx, &input.email, password_hash, Role::Student).await?;
        let student = insert_profile::<Student>(&mut tx, user.id, input.changes()).await?;
        tx.commit().await?;

        tracing::info!(student_id = %student.id, user_id = %user.id, "Created student account");
        Ok(student)
    }

    pub async fn student_by_enrollment(&self, enrollment_number: &str) -> Result<Student, ApiError> {
        Repository::<Student>::find_by(self.db.pool(), json!({ "enrollment_number": enrollment_number.trim() }))
            .await?
            .ok_or_else(|| ApiError::not_found("Student not found."))
    }

    /// Remove the profile together with its login account
    pub async fn hard_delete_faculty(&self, id: Uuid) -> Result<(), ApiError> {
        let faculty = Repository::<Faculty>::find_any(self.db.pool(), id)
            .await?
            .ok_or_else(|| ApiError::not_found("Faculty not found."))?;
        delete_account::<Faculty>(self.db, faculty.id, faculty.user_id).await
    }

    pub async fn hard_delete_student(&self, id: Uuid) -> Result<(), ApiError> {
        let student = Repository::<Student>::find_any(self.db.pool(), id)
            .await?
            .ok_or_else(|| ApiError::not_found("Student not found."))?;
        delete_account::<Student>(self.db, student.id, student.user_id).await
    }

    /// Student profile of the caller; 403 for any other role or a deleted profile
    pub async fn current_student(&self, user: &AuthUser) -> Result<Student, ApiError> {
        if !user.is(Role::Student) {
            return Err(ApiError::permission_denied());
        }
        Repository::<Student>::find_by(self.db.pool(), json!({ "user_id": user.user_id.to_string() }))
            .await?
            .ok_or_else(|| ApiError::forbidden("No student profile is linked to this account."))
    }

    pub async fn current_faculty(&self, user: &AuthUser) -> Result<Faculty, ApiError> {
        if !user.is(Role::Faculty) {
            return Err(ApiError::permission_denied());
        }
        Repository::<Faculty>::find_by(self.db.pool(), json!({ "user_id": user.user_id.to_string() }))
            .await?
            .ok_or_else(|| ApiError::forbidden("No faculty profile is linked to this account."))
    }
}

pub async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password_hash: String,
    role: Role,
) -> Result<User, ApiError> {
    let changes: Changes = vec![
        ("email", SqlValue::text(normalize_email(email))),
        ("password_hash", SqlValue::Text(password_hash)),
        ("role", role.to_sql()),
    ];
    Ok(Repository::<User>::insert(&mut **tx, changes).await?)
}

async fn insert_profile<T: crate::database::Resource>(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    mut changes: Changes,
) -> Result<T, ApiError> {
    changes.insert(0, ("user_id", SqlValue::Uuid(user_id)));
    Ok(Repository::<T>::insert(&mut **tx, changes).await?)
}

async fn delete_account<T: crate::database::Resource>(db: &Database, id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let mut tx = db.pool().begin().await?;
    Repository::<T>::hard_delete(&mut *tx, id).await?;
    Repository::<User>::hard_delete(&mut *tx, user_id).await?;
    tx.commit().await?;
    tracing::warn!(resource = T::TABLE, %id, %user_id, "Permanently deleted account");
    Ok(())
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Asha.Patel@LDRP.ac.in "), "asha.patel@ldrp.ac.in");
    }
}
