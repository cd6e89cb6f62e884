use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate::Validator;
use super::{Changeset, Creatable, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: Uuid,
    pub name: String,
    pub semester_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Division {
    const TABLE: &'static str = "divisions";
    const NAME: &'static str = "Division";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("name", ColumnKind::Text),
        col("semester_id", ColumnKind::Uuid),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name"];
    const SORTABLE: &'static [&'static str] = &["name", "created_at"];
    const DEFAULT_ORDER: &'static str = "name asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[("semesterId", "semester_id")];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDivision {
    pub name: String,
    pub semester_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDivision {
    pub name: Option<String>,
}

impl Changeset for CreateDivision {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new().length("name", &self.name, 1, 100).finish()
    }

    fn changes(&self) -> Changes {
        vec![("name", SqlValue::text(self.name.trim())), ("semester_id", SqlValue::Uuid(self.semester_id))]
    }
}

impl Changeset for UpdateDivision {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new().opt_length("name", self.name.as_deref(), 1, 100).finish()
    }

    fn changes(&self) -> Changes {
        self.name.iter().map(|name| ("name", SqlValue::text(name.trim()))).collect()
    }
}

impl Creatable for Division {
    type Create = CreateDivision;
}

impl Editable for Division {
    type Update = UpdateDivision;
}
