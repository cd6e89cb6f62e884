use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::SubjectType;
use super::validate::Validator;
use super::{Changeset, Creatable, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

/// Master subject of a department, taught in a given semester number.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub code: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub semester_number: i32,
    pub department_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Subject {
    const TABLE: &'static str = "subjects";
    const NAME: &'static str = "Subject";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("name", ColumnKind::Text),
        col("abbreviation", ColumnKind::Text),
        col("code", ColumnKind::Text),
        col("type", SubjectType::KIND),
        col("semester_number", ColumnKind::Int),
        col("department_id", ColumnKind::Uuid),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "abbreviation", "code"];
    const SORTABLE: &'static [&'static str] = &["name", "code", "semester_number", "created_at"];
    const DEFAULT_ORDER: &'static str = "semester_number asc, name asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("departmentId", "department_id"),
        ("semesterNumber", "semester_number"),
        ("type", "type"),
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubject {
    pub name: String,
    pub abbreviation: String,
    pub code: String,
    #[serde(rename = "type", default = "mandatory")]
    pub subject_type: SubjectType,
    pub semester_number: i32,
    pub department_id: Uuid,
}

fn mandatory() -> SubjectType {
    SubjectType::Mandatory
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubject {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub code: Option<String>,
    #[serde(rename = "type")]
    pub subject_type: Option<SubjectType>,
    pub semester_number: Option<i32>,
}

impl Changeset for CreateSubject {
    fn validate(&self) -> Result<(), ApiError> {
        Validator::new()
            .length("name", &self.name, 1, 150)
            .length("abbreviation", &self.abbreviation, 1, 20)
            .length("code", &self.code, 1, 20)
            .range("semesterNumber", self.semester_number, 1, 12)
            .finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("name", SqlValue::text(self.name.trim())),
            ("abbreviation", SqlValue::text(self.abbreviation.trim())),
            ("code", SqlValue::text(self.code.trim())),
            ("type", self.subject_type.to_sql()),
            ("semester_number", SqlValue::Int(self.semester_number)),
            ("department_id", SqlValue::Uuid(self.department_id)),
        ]
    }
}

impl Changeset for UpdateSubject {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("name", self.name.as_deref(), 1, 150)
            .opt_length("abbreviation", self.abbreviation.as_deref(), 1, 20)
            .opt_length("code", self.code.as_deref(), 1, 20);
        if let Some(number) = self.semester_number {
            v.range("semesterNumber", number, 1, 12);
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
        if let Some(code) = &self.code {
            changes.push(("code", SqlValue::text(code.trim())));
        }
        if let Some(subject_type) = self.subject_type {
            changes.push(("type", subject_type.to_sql()));
        }
        if let Some(number) = self.semester_number {
            changes.push(("semester_number", SqlValue::Int(number)));
        }
        changes
    }
}

impl Creatable for Subject {
    type Create = CreateSubject;
}

impl Editable for Subject {
    type Update = UpdateSubject;
}
