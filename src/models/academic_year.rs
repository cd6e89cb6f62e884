use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate::Validator;
use super::Changeset;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: Uuid,
    pub year: String,
    pub college_id: Uuid,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for AcademicYear {
    const TABLE: &'static str = "academic_years";
    const NAME: &'static str = "Academic year";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("year", ColumnKind::Text),
        col("college_id", ColumnKind::Uuid),
        col("is_active", ColumnKind::Bool),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["year"];
    const SORTABLE: &'static [&'static str] = &["year", "created_at"];
    const DEFAULT_ORDER: &'static str = "year desc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] =
        &[("collegeId", "college_id"), ("isActive", "is_active")];
}

/// `isActive: true` activates the new year and deactivates the rest of the college.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAcademicYear {
    pub year: String,
    pub college_id: Uuid,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAcademicYear {
    pub year: Option<String>,
    pub is_active: Option<bool>,
}

impl Changeset for CreateAcademicYear {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new().academic_year("year", &self.year).finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("year", SqlValue::text(self.year.trim())),
            ("college_id", SqlValue::Uuid(self.college_id)),
            ("is_active", SqlValue::Bool(false)),
        ]
    }
}

impl Changeset for UpdateAcademicYear {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        if let Some(year) = &self.year {
            v.academic_year("year", year);
        }
        v.finish()
    }

    /// The active flag is applied separately so the college-wide switch stays atomic.
    fn changes(&self) -> Changes {
        self.year.iter().map(|year| ("year", SqlValue::text(year.trim()))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_always_inserts_inactive() {
        let input = CreateAcademicYear { year: "2025-2026".into(), college_id: Uuid::new_v4(), is_active: true };
        assert!(input.validate().is_ok());
        assert!(input.changes().contains(&("is_active", SqlValue::Bool(false))));
    }

    #[test]
    fn non_consecutive_years_are_rejected() {
        let input = CreateAcademicYear { year: "2025-2027".into(), college_id: Uuid::new_v4(), is_active: false };
        assert!(input.validate().is_err());
    }

    #[test]
    fn update_leaves_active_flag_out_of_changes() {
        let input = UpdateAcademicYear { year: None, is_active: Some(true) };
        assert!(input.changes().is_empty());
    }
}
