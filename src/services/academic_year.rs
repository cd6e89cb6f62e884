use serde_json::json;
use uuid::Uuid;

use crate::database::{Database, Repository, SqlValue};
use crate::error::ApiError;
use crate::models::academic_year::{CreateAcademicYear, UpdateAcademicYear};
use crate::models::{AcademicYear, Changeset, College};

/// Academic years; at most one per college is active.
pub struct AcademicYearService<'a> {
    db: &'a Database,
}

impl<'a> AcademicYearService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: &CreateAcademicYear) -> Result<AcademicYear, ApiError> {
        if Repository::<College>::find(self.db.pool(), input.college_id).await?.is_none() {
            return Err(ApiError::bad_request("College does not exist."));
        }

        let mut tx = self.db.pool().begin().await?;
        let mut year = Repository::<AcademicYear>::insert(&mut *tx, input.changes()).await?;
        if input.is_active {
            year = activate_in(&mut tx, &year).await?;
        }
        tx.commit().await?;

        tracing::info!(academic_year_id = %year.id, year = %year.year, "Created academic year");
        Ok(year)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateAcademicYear) -> Result<AcademicYear, ApiError> {
        let changes = input.changes();
        if changes.is_empty() && input.is_active.is_none() {
            return Err(ApiError::bad_request("At least one field must be provided for update."));
        }

        let mut tx = self.db.pool().begin().await?;
        let mut year = if changes.is_empty() {
            Repository::<AcademicYear>::get(&mut *tx, id).await?
        } else {
            Repository::<AcademicYear>::update(&mut *tx, id, changes).await?
        };
        match input.is_active {
            Some(true) => year = activate_in(&mut tx, &year).await?,
            Some(false) => year = set_active(&mut tx, year.id, false).await?,
            None => {}
        }
        tx.commit().await?;
        Ok(year)
    }

    /// Active year of a college, or of any college when none is given
    pub async fn active(&self, college_id: Option<Uuid>) -> Result<AcademicYear, ApiError> {
        let where_clause = match college_id {
            Some(college_id) => json!({ "college_id": college_id.to_string(), "is_active": true }),
            None => json!({ "is_active": true }),
        };
        Repository::<AcademicYear>::find_by(self.db.pool(), where_clause)
            .await?
            .ok_or_else(|| ApiError::not_found("No active academic year found."))
    }

    pub async fn activate(&self, id: Uuid) -> Result<AcademicYear, ApiError> {
        let mut tx = self.db.pool().begin().await?;
        let year = Repository::<AcademicYear>::get(&mut *tx, id).await?;
        let year = activate_in(&mut tx, &year).await?;
        tx.commit().await?;
        tracing::info!(academic_year_id = %id, college_id = %year.college_id, "Activated academic year");
        Ok(year)
    }

    pub async fn deactivate(&self, id: Uuid) -> Result<AcademicYear, ApiError> {
        let mut tx = self.db.pool().begin().await?;
        let year = set_active(&mut tx, id, false).await?;
        tx.commit().await?;
        Ok(year)
    }
}

async fn activate_in(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    year: &AcademicYear,
) -> Result<AcademicYear, ApiError> {
    sqlx::query(
        "UPDATE academic_years SET is_active = false, updated_at = now() \
         WHERE college_id = $1 AND id <> $2 AND is_active = true",
    )
    .bind(year.college_id)
    .bind(year.id)
    .execute(&mut **tx)
    .await?;
    set_active(tx, year.id, true).await
}

async fn set_active(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
    active: bool,
) -> Result<AcademicYear, ApiError> {
    Ok(Repository::<AcademicYear>::update(&mut **tx, id, vec![("is_active", SqlValue::Bool(active))]).await?)
}
