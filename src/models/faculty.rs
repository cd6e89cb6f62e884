use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::Designation;
use super::validate::{blank_to_none, Validator};
use super::{Changeset, Editable};
use crate::auth::password;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub abbreviation: Option<String>,
    pub designation: Designation,
    pub joining_date: Option<NaiveDate>,
    pub department_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Faculty {
    const TABLE: &'static str = "faculties";
    const NAME: &'static str = "Faculty";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("user_id", ColumnKind::Uuid),
        col("full_name", ColumnKind::Text),
        col("abbreviation", ColumnKind::Text),
        col("designation", Designation::KIND),
        col("joining_date", ColumnKind::Date),
        col("department_id", ColumnKind::Uuid),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["full_name", "abbreviation"];
    const SORTABLE: &'static [&'static str] = &["full_name", "joining_date", "created_at"];
    const DEFAULT_ORDER: &'static str = "full_name asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] =
        &[("departmentId", "department_id"), ("designation", "designation")];
}

/// Faculty profile plus the credentials of its login account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFaculty {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub abbreviation: Option<String>,
    pub designation: Designation,
    pub joining_date: Option<NaiveDate>,
    pub department_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFaculty {
    pub full_name: Option<String>,
    pub abbreviation: Option<String>,
    pub designation: Option<Designation>,
    pub joining_date: Option<NaiveDate>,
    pub department_id: Option<Uuid>,
}

fn check_abbreviation(v: &mut Validator, abbreviation: Option<&str>) {
    if let Some(abbreviation) = blank_to_none(abbreviation) {
        v.length("abbreviation", &abbreviation, 1, 10).check(
            abbreviation.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '.'),
            "abbreviation",
            "Abbreviation can only contain uppercase letters, numbers, and dots.",
        );
    }
}

impl Changeset for CreateFaculty {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.email("email", &self.email).length("fullName", &self.full_name, 2, 100);
        if let Err(message) = password::check_policy(&self.password) {
            v.check(false, "password", message);
        }
        check_abbreviation(&mut v, self.abbreviation.as_deref());
        v.finish()
    }

    /// Profile columns only; the caller links the created user.
    fn changes(&self) -> Changes {
        vec![
            ("full_name", SqlValue::text(self.full_name.trim())),
            ("abbreviation", SqlValue::opt_text(blank_to_none(self.abbreviation.as_deref()))),
            ("designation", self.designation.to_sql()),
            ("joining_date", SqlValue::opt_date(self.joining_date)),
            ("department_id", SqlValue::Uuid(self.department_id)),
        ]
    }
}

impl Changeset for UpdateFaculty {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("fullName", self.full_name.as_deref(), 2, 100);
        check_abbreviation(&mut v, self.abbreviation.as_deref());
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(full_name) = &self.full_name {
            changes.push(("full_name", SqlValue::text(full_name.trim())));
        }
        if self.abbreviation.is_some() {
            changes.push(("abbreviation", SqlValue::opt_text(blank_to_none(self.abbreviation.as_deref()))));
        }
        if let Some(designation) = self.designation {
            changes.push(("designation", designation.to_sql()));
        }
        if let Some(joining_date) = self.joining_date {
            changes.push(("joining_date", SqlValue::Date(joining_date)));
        }
        if let Some(department_id) = self.department_id {
            changes.push(("department_id", SqlValue::Uuid(department_id)));
        }
        changes
    }
}

impl Editable for Faculty {
    type Update = UpdateFaculty;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input() -> CreateFaculty {
        serde_json::from_value(json!({
            "email": "ravi.patel@ldrp.ac.in",
            "password": "Str0ng@Pass",
            "fullName": "Ravi Patel",
            "abbreviation": "RP",
            "designation": "ASST_PROFESSOR",
            "joiningDate": "2019-06-15",
            "departmentId": Uuid::new_v4(),
        }))
        .unwrap()
    }

    #[test]
    fn valid_faculty_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn weak_password_is_a_field_error() {
        let mut faculty = input();
        faculty.password = "password".into();
        match faculty.validate() {
            Err(ApiError::ValidationError { field_errors: Some(fields), .. }) => {
                assert!(fields.contains_key("password"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn lowercase_abbreviation_is_rejected() {
        let mut faculty = input();
        faculty.abbreviation = Some("rp".into());
        assert!(faculty.validate().is_err());
    }
}
