use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate::Validator;
use super::{Changeset, Editable};
use crate::auth::password;
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub enrollment_number: String,
    pub batch: String,
    pub department_id: Uuid,
    pub semester_id: Uuid,
    pub division_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Student {
    const TABLE: &'static str = "students";
    const NAME: &'static str = "Student";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("user_id", ColumnKind::Uuid),
        col("full_name", ColumnKind::Text),
        col("enrollment_number", ColumnKind::Text),
        col("batch", ColumnKind::Text),
        col("department_id", ColumnKind::Uuid),
        col("semester_id", ColumnKind::Uuid),
        col("division_id", ColumnKind::Uuid),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["full_name", "enrollment_number"];
    const SORTABLE: &'static [&'static str] = &["full_name", "enrollment_number", "created_at"];
    const DEFAULT_ORDER: &'static str = "enrollment_number asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("departmentId", "department_id"),
        ("semesterId", "semester_id"),
        ("divisionId", "division_id"),
        ("batch", "batch"),
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudent {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub enrollment_number: String,
    pub batch: String,
    pub department_id: Uuid,
    pub semester_id: Uuid,
    pub division_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    pub full_name: Option<String>,
    pub enrollment_number: Option<String>,
    pub batch: Option<String>,
    pub department_id: Option<Uuid>,
    pub semester_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

fn check_enrollment_number(v: &mut Validator, value: &str) {
    v.length("enrollmentNumber", value, 1, 50).check(
        value.trim().chars().all(|c| c.is_ascii_alphanumeric() || c == '-'),
        "enrollmentNumber",
        "Enrollment number can only contain letters, numbers, and hyphens.",
    );
}

impl Changeset for CreateStudent {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.email("email", &self.email)
            .length("fullName", &self.full_name, 1, 100)
            .length("batch", &self.batch, 1, 20);
        check_enrollment_number(&mut v, &self.enrollment_number);
        if let Err(message) = password::check_policy(&self.password) {
            v.check(false, "password", message);
        }
        v.finish()
    }

    /// Profile columns only; the caller links the created user.
    fn changes(&self) -> Changes {
        vec![
            ("full_name", SqlValue::text(self.full_name.trim())),
            ("enrollment_number", SqlValue::text(self.enrollment_number.trim())),
            ("batch", SqlValue::text(self.batch.trim())),
            ("department_id", SqlValue::Uuid(self.department_id)),
            ("semester_id", SqlValue::Uuid(self.semester_id)),
            ("division_id", SqlValue::Uuid(self.division_id)),
        ]
    }
}

impl Changeset for UpdateStudent {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("fullName", self.full_name.as_deref(), 1, 100)
            .opt_length("batch", self.batch.as_deref(), 1, 20);
        if let Some(enrollment_number) = &self.enrollment_number {
            check_enrollment_number(&mut v, enrollment_number);
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(full_name) = &self.full_name {
            changes.push(("full_name", SqlValue::text(full_name.trim())));
        }
        if let Some(enrollment_number) = &self.enrollment_number {
            changes.push(("enrollment_number", SqlValue::text(enrollment_number.trim())));
        }
        if let Some(batch) = &self.batch {
            changes.push(("batch", SqlValue::text(batch.trim())));
        }
        for (column, value) in [
            ("department_id", self.department_id),
            ("semester_id", self.semester_id),
            ("division_id", self.division_id),
        ] {
            if let Some(id) = value {
                changes.push((column, SqlValue::Uuid(id)));
            }
        }
        changes
    }
}

impl Editable for Student {
    type Update = UpdateStudent;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_numbers_are_restricted() {
        let mut v = Validator::new();
        check_enrollment_number(&mut v, "22CE-041");
        assert!(v.finish().is_ok());
        check_enrollment_number(&mut v, "22 CE/041");
        assert!(v.finish().is_err());
    }

    #[test]
    fn update_collects_only_present_ids() {
        let semester_id = Uuid::new_v4();
        let update = UpdateStudent { semester_id: Some(semester_id), ..Default::default() };
        assert_eq!(update.changes(), vec![("semester_id", SqlValue::Uuid(semester_id))]);
    }
}
