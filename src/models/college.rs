use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate::{blank_to_none, Validator};
use super::{Changeset, Creatable, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct College {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: String,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for College {
    const TABLE: &'static str = "colleges";
    const NAME: &'static str = "College";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("name", ColumnKind::Text),
        col("abbreviation", ColumnKind::Text),
        col("website", ColumnKind::Text),
        col("address", ColumnKind::Text),
        col("contact_number", ColumnKind::Text),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["name", "abbreviation", "address"];
    const SORTABLE: &'static [&'static str] = &["name", "abbreviation", "created_at"];
    const DEFAULT_ORDER: &'static str = "name asc";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollege {
    pub name: String,
    pub abbreviation: String,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollege {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub contact_number: Option<String>,
}

fn validate_optional(v: &mut Validator, website: Option<&str>, address: Option<&str>, contact: Option<&str>) {
    if let Some(website) = blank_to_none(website) {
        v.url("website", &website);
    }
    if let Some(address) = blank_to_none(address) {
        v.length("address", &address, 1, 255);
    }
    if let Some(contact) = blank_to_none(contact) {
        v.phone("contactNumber", &contact);
    }
}

impl Changeset for CreateCollege {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("name", &self.name, 3, 150).length("abbreviation", &self.abbreviation, 2, 20);
        validate_optional(&mut v, self.website.as_deref(), self.address.as_deref(), self.contact_number.as_deref());
        v.finish()
    }

    fn changes(&self) -> Changes {
        vec![
            ("name", SqlValue::text(self.name.trim())),
            ("abbreviation", SqlValue::text(self.abbreviation.trim())),
            ("website", SqlValue::opt_text(blank_to_none(self.website.as_deref()))),
            ("address", SqlValue::opt_text(blank_to_none(self.address.as_deref()))),
            ("contact_number", SqlValue::opt_text(blank_to_none(self.contact_number.as_deref()))),
        ]
    }
}

impl Changeset for UpdateCollege {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("name", self.name.as_deref(), 3, 150)
            .opt_length("abbreviation", self.abbreviation.as_deref(), 2, 20);
        validate_optional(&mut v, self.website.as_deref(), self.address.as_deref(), self.contact_number.as_deref());
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
        // blank strings clear the optional fields
        if self.website.is_some() {
            changes.push(("website", SqlValue::opt_text(blank_to_none(self.website.as_deref()))));
        }
        if self.address.is_some() {
            changes.push(("address", SqlValue::opt_text(blank_to_none(self.address.as_deref()))));
        }
        if self.contact_number.is_some() {
            changes.push(("contact_number", SqlValue::opt_text(blank_to_none(self.contact_number.as_deref()))));
        }
        changes
    }
}

impl Creatable for College {
    type Create = CreateCollege;
}

impl Editable for College {
    type Update = UpdateCollege;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_fields_are_stored_as_null() {
        let input = CreateCollege {
            name: " LDRP Institute of Technology and Research ".into(),
            abbreviation: "LDRP-ITR".into(),
            website: Some("  ".into()),
            address: None,
            contact_number: Some(String::new()),
        };
        assert!(input.validate().is_ok());
        let changes = input.changes();
        assert_eq!(changes[0].1, SqlValue::Text("LDRP Institute of Technology and Research".into()));
        assert_eq!(changes[2].1, SqlValue::Null(ColumnKind::Text));
        assert_eq!(changes[4].1, SqlValue::Null(ColumnKind::Text));
    }

    #[test]
    fn short_names_fail_validation() {
        let input = CreateCollege {
            name: "AB".into(),
            abbreviation: "A".into(),
            website: Some("not a url".into()),
            address: None,
            contact_number: None,
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn empty_update_has_no_changes() {
        assert!(UpdateCollege::default().changes().is_empty());
    }
}
