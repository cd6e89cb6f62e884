use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::SemesterType;
use super::validate::Validator;
use super::{Changeset, Creatable, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

/// A semester number of one department within one academic year.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: Uuid,
    pub semester_number: i32,
    pub semester_type: SemesterType,
    pub department_id: Uuid,
    pub academic_year_id: Uuid,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Semester {
    const TABLE: &'static str = "semesters";
    const NAME: &'static str = "Semester";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("semester_number", ColumnKind::Int),
        col("semester_type", SemesterType::KIND),
        col("department_id", ColumnKind::Uuid),
        col("academic_year_id", ColumnKind::Uuid),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SORTABLE: &'static [&'static str] = &["semester_number", "created_at"];
    const DEFAULT_ORDER: &'static str = "semester_number asc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[
        ("departmentId", "department_id"),
        ("academicYearId", "academic_year_id"),
        ("semesterNumber", "semester_number"),
        ("semesterType", "semester_type"),
    ];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSemester {
    pub semester_number: i32,
    pub semester_type: SemesterType,
    pub department_id: Uuid,
    pub academic_year_id: Uuid,
}

/// Both fields travel together so the parity rule can be checked.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSemester {
    pub semester_number: Option<i32>,
    pub semester_type: Option<SemesterType>,
}

fn check_parity(v: &mut Validator, number: i32, semester_type: SemesterType) {
    v.check(
        SemesterType::for_number(number) == semester_type,
        "semesterType",
        "Odd semester numbers must be ODD and even numbers EVEN.",
    );
}

impl Changeset for CreateSemester {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.range("semesterNumber", self.semester_number, 1, 12);
        check_parity(&mut v, self.semester_number, self.semester_type);
        v.finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("semester_number", SqlValue::Int(self.semester_number)),
            ("semester_type", self.semester_type.to_sql()),
            ("department_id", SqlValue::Uuid(self.department_id)),
            ("academic_year_id", SqlValue::Uuid(self.academic_year_id)),
        ]
    }
}

impl Changeset for UpdateSemester {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        match (self.semester_number, self.semester_type) {
            (Some(number), Some(semester_type)) => {
                v.range("semesterNumber", number, 1, 12);
                check_parity(&mut v, number, semester_type);
            }
            (None, None) => {}
            _ => {
                v.check(false, "semesterType", "semesterNumber and semesterType must be updated together.");
            }
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(number) = self.semester_number {
            changes.push(("semester_number", SqlValue::Int(number)));
        }
        if let Some(semester_type) = self.semester_type {
            changes.push(("semester_type", semester_type.to_sql()));
        }
        changes
    }
}

impl Creatable for Semester {
    type Create = CreateSemester;
}

impl Editable for Semester {
    type Update = UpdateSemester;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(number: i32, semester_type: SemesterType) -> CreateSemester {
        CreateSemester {
            semester_number: number,
            semester_type,
            department_id: Uuid::new_v4(),
            academic_year_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn type_must_match_parity() {
        assert!(create(3, SemesterType::Odd).validate().is_ok());
        assert!(create(3, SemesterType::Even).validate().is_err());
        assert!(create(13, SemesterType::Odd).validate().is_err());
    }

    #[test]
    fn partial_parity_updates_are_rejected() {
        let update = UpdateSemester { semester_number: Some(4), semester_type: None };
        assert!(update.validate().is_err());
        let update = UpdateSemester { semester_number: Some(4), semester_type: Some(SemesterType::Even) };
        assert!(update.validate().is_ok());
        assert_eq!(update.changes()[1].1.placeholder(2), "$2::semester_type");
    }
}
