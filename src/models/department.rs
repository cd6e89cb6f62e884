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
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub college_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Department {
    const TABLE: &'static str = "departments";
    const NAME: &'static str = "Department";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("name", ColumnKind::Text),
        col("abbreviation", ColumnKind::Text),
        col("college_id", ColumnKind::Uuid),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "abbreviation"];
    const SORTABLE: &'static [&'static str] = &["name", "abbreviation", "created_at"];
    const DEFAULT_ORDER: &'static str = "name asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[("collegeId", "college_id")];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    pub name: String,
    pub abbreviation: String,
    pub college_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
}

fn check_abbreviation(v: &mut Validator, abbreviation: &str) {
    v.length("abbreviation", abbreviation, 2, 10).check(
        abbreviation.trim().chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
        "abbreviation",
        "Abbreviation must contain only uppercase letters and numbers.",
    );
}

impl Changeset for CreateDepartment {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("name", &self.name, 3, 100);
        check_abbreviation(&mut v, &self.abbreviation);
        v.finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("name", SqlValue::text(self.name.trim())),
            ("abbreviation", SqlValue::text(self.abbreviation.trim())),
            ("college_id", SqlValue::Uuid(self.college_id)),
        ]
    }
}

impl Changeset for UpdateDepartment {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("name", self.name.as_deref(), 3, 100);
        if let Some(abbreviation) = &self.abbreviation {
            check_abbreviation(&mut v, abbreviation);
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(name) = &self.name {
            changes.push(("name", SqlValue::text(name.trim())));
        }
        if let Some(abbreviation) = &self.abbreviation {
            changes.push(("abbreviation", SqlValue::text(abbreviation.trim())));
        }
        changes
    }
}

impl Creatable for Department {
    type Create = CreateDepartment;
}

impl Editable for Department {
    type Update = UpdateDepartment;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviation_must_be_uppercase_alphanumeric() {
        let mut input = CreateDepartment {
            name: "Computer Engineering".into(),
            abbreviation: "CE".into(),
            college_id: Uuid::new_v4(),
        };
        assert!(input.validate().is_ok());
        input.abbreviation = "ce-1".into();
        assert!(input.validate().is_err());
    }
}
