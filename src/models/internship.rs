use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::enums::InternshipStatus;
use super::validate::{blank_to_none, Validator};
use super::{Changeset, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: Uuid,
    pub student_id: Uuid,
    pub company_name: String,
    pub role: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: InternshipStatus,
    pub stipend: Option<Decimal>,
    pub location: Option<String>,
    pub offer_letter_path: Option<String>,
    pub noc_path: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Internship {
    const TABLE: &'static str = "internships";
    const NAME: &'static str = "Internship";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("student_id", ColumnKind::Uuid),
        col("company_name", ColumnKind::Text),
        col("role", ColumnKind::Text),
        col("description", ColumnKind::Text),
        col("start_date", ColumnKind::Date),
        col("end_date", ColumnKind::Date),
        col("status", InternshipStatus::KIND),
        col("stipend", ColumnKind::Decimal),
        col("location", ColumnKind::Text),
        col("offer_letter_path", ColumnKind::Text),
        col("noc_path", ColumnKind::Text),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["company_name", "role", "location"];
    const SORTABLE: &'static [&'static str] = &["company_name", "start_date", "created_at"];
    const DEFAULT_ORDER: &'static str = "start_date desc";
    const PARENT_FILTERS: &'static [(&'static str, &'static str)] = &[("status", "status")];
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternship {
    pub company_name: String,
    pub role: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "applied")]
    pub status: InternshipStatus,
    pub stipend: Option<Decimal>,
    pub location: Option<String>,
    pub offer_letter_path: Option<String>,
    pub noc_path: Option<String>,
}

fn applied() -> InternshipStatus {
    InternshipStatus::Applied
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternship {
    pub company_name: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<InternshipStatus>,
    pub stipend: Option<Decimal>,
    pub location: Option<String>,
    pub offer_letter_path: Option<String>,
    pub noc_path: Option<String>,
}

struct Optional<'a> {
    description: Option<&'a str>,
    stipend: Option<Decimal>,
    location: Option<&'a str>,
    offer_letter_path: Option<&'a str>,
    noc_path: Option<&'a str>,
}

fn check_optional(v: &mut Validator, fields: Optional<'_>) {
    if let Some(description) = fields.description {
        v.length("description", description, 0, 1000);
    }
    if let Some(stipend) = fields.stipend {
        v.range("stipend", stipend, Decimal::ZERO, Decimal::from(1_000_000));
    }
    if let Some(location) = fields.location {
        v.length("location", location, 0, 100);
    }
    if let Some(path) = blank_to_none(fields.offer_letter_path) {
        v.url("offerLetterPath", &path);
    }
    if let Some(path) = blank_to_none(fields.noc_path) {
        v.url("nocPath", &path);
    }
}

/// End date must follow the start date when both are known
pub fn check_dates(v: &mut Validator, start: Option<NaiveDate>, end: Option<NaiveDate>) {
    if let (Some(start), Some(end)) = (start, end) {
        v.check(end > start, "endDate", "End date must be after the start date.");
    }
}

impl Changeset for CreateInternship {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("companyName", &self.company_name, 1, 100).length("role", &self.role, 1, 100);
        check_dates(&mut v, Some(self.start_date), self.end_date);
        check_optional(
            &mut v,
            Optional {
                description: self.description.as_deref(),
                stipend: self.stipend,
                location: self.location.as_deref(),
                offer_letter_path: self.offer_letter_path.as_deref(),
                noc_path: self.noc_path.as_deref(),
            },
        );
        v.finish()
    }

    /// The owning student is added by the caller.
    fn changes(&self) -> Changes {
        vec![
            ("company_name", SqlValue::text(self.company_name.trim())),
            ("role", SqlValue::text(self.role.trim())),
            ("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))),
            ("start_date", SqlValue::Date(self.start_date)),
            ("end_date", SqlValue::opt_date(self.end_date)),
            ("status", self.status.to_sql()),
            ("stipend", SqlValue::opt_decimal(self.stipend)),
            ("location", SqlValue::opt_text(blank_to_none(self.location.as_deref()))),
            ("offer_letter_path", SqlValue::opt_text(blank_to_none(self.offer_letter_path.as_deref()))),
            ("noc_path", SqlValue::opt_text(blank_to_none(self.noc_path.as_deref()))),
        ]
    }
}

impl Changeset for UpdateInternship {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("companyName", self.company_name.as_deref(), 1, 100)
            .opt_length("role", self.role.as_deref(), 1, 100);
        check_dates(&mut v, self.start_date, self.end_date);
        check_optional(
            &mut v,
            Optional {
                description: self.description.as_deref(),
                stipend: self.stipend,
                location: self.location.as_deref(),
                offer_letter_path: self.offer_letter_path.as_deref(),
                noc_path: self.noc_path.as_deref(),
            },
        );
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(company_name) = &self.company_name {
            changes.push(("company_name", SqlValue::text(company_name.trim())));
        }
        if let Some(role) = &self.role {
            changes.push(("role", SqlValue::text(role.trim())));
        }
        if let Some(start_date) = self.start_date {
            changes.push(("start_date", SqlValue::Date(start_date)));
        }
        if let Some(end_date) = self.end_date {
            changes.push(("end_date", SqlValue::Date(end_date)));
        }
        if let Some(status) = self.status {
            changes.push(("status", status.to_sql()));
        }
        if let Some(stipend) = self.stipend {
            changes.push(("stipend", SqlValue::Decimal(stipend)));
        }
        for (column, value) in [
            ("description", &self.description),
            ("location", &self.location),
            ("offer_letter_path", &self.offer_letter_path),
            ("noc_path", &self.noc_path),
        ] {
            if value.is_some() {
                changes.push((column, SqlValue::opt_text(blank_to_none(value.as_deref()))));
            }
        }
        changes
    }
}

/// Internship counts by status
#[derive(Debug, Clone, Default, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InternshipStats {
    pub total: i64,
    pub applied: i64,
    pub ongoing: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub students: i64,
}

impl Editable for Internship {
    type Update = UpdateInternship;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> serde_json::Value {
        json!({
            "companyName": "Infosys",
            "role": "Backend Intern",
            "startDate": "2025-05-01",
            "endDate": "2025-07-31",
            "stipend": 15000,
            "offerLetterPath": "https://res.cloudinary.com/demo/offer.pdf",
        })
    }

    #[test]
    fn status_defaults_to_applied() {
        let input: CreateInternship = serde_json::from_value(base()).unwrap();
        assert_eq!(input.status, InternshipStatus::Applied);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn end_date_must_follow_start() {
        let mut body = base();
        body["endDate"] = json!("2025-04-30");
        let input: CreateInternship = serde_json::from_value(body).unwrap();
        assert!(input.validate().is_err());
    }

    #[test]
    fn stipend_is_capped() {
        let mut body = base();
        body["stipend"] = json!(2_000_000);
        let input: CreateInternship = serde_json::from_value(body).unwrap();
        assert!(input.validate().is_err());
    }
}
