use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::validate::{blank_to_none, url_host, Validator};
use super::{Changeset, Editable};
use crate::database::resource::columns::*;
use crate::database::value::{col, ColumnDef, ColumnKind};
use crate::database::{Changes, Resource, SqlValue};
use crate::error::ApiError;

/// File hosts certificate links may point at
pub const TRUSTED_HOSTS: &[&str] = &["cloudinary.com", "drive.google.com", "dropbox.com", "amazonaws.com"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub student_id: Uuid,
    pub title: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub description: Option<String>,
    pub certificate_path: String,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Certificate {
    const TABLE: &'static str = "certificates";
    const NAME: &'static str = "Certificate";
    const COLUMNS: &'static [ColumnDef] = &[
        ID,
        col("student_id", ColumnKind::Uuid),
        col("title", ColumnKind::Text),
        col("issuing_organization", ColumnKind::Text),
        col("issue_date", ColumnKind::Date),
        col("description", ColumnKind::Text),
        col("certificate_path", ColumnKind::Text),
        IS_DELETED,
        CREATED_AT,
        UPDATED_AT,
    ];
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "issuing_organization"];
    const SORTABLE: &'static [&'static str] = &["title", "issue_date", "created_at"];
    const DEFAULT_ORDER: &'static str = "issue_date desc";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificate {
    pub title: String,
    pub issuing_organization: String,
    pub issue_date: NaiveDate,
    pub description: Option<String>,
    pub certificate_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCertificate {
    pub title: Option<String>,
    pub issuing_organization: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub certificate_path: Option<String>,
}

pub fn is_trusted_host(url: &str) -> bool {
    url_host(url)
        .map(|host| TRUSTED_HOSTS.iter().any(|trusted| host == *trusted || host.ends_with(&format!(".{}", trusted))))
        .unwrap_or(false)
}

fn check_path(v: &mut Validator, path: &str) {
    v.url("certificatePath", path).check(
        is_trusted_host(path),
        "certificatePath",
        "Certificate must be uploaded to a trusted file hosting service.",
    );
}

fn check_issue_date(v: &mut Validator, issue_date: NaiveDate) {
    v.check(
        issue_date <= Utc::now().date_naive(),
        "issueDate",
        "Issue date cannot be in the future.",
    );
}

impl Changeset for CreateCertificate {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.length("title", &self.title, 2, 200)
            .length("issuingOrganization", &self.issuing_organization, 2, 150);
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }
        check_issue_date(&mut v, self.issue_date);
        check_path(&mut v, &self.certificate_path);
        v.finish()
    }

    /// The owning student is added by the caller.
    fn changes(&self) -> Changes {
        vec![
            ("title", SqlValue::text(self.title.trim())),
            ("issuing_organization", SqlValue::text(self.issuing_organization.trim())),
            ("issue_date", SqlValue::Date(self.issue_date)),
            ("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))),
            ("certificate_path", SqlValue::text(self.certificate_path.trim())),
        ]
    }
}

impl Changeset for UpdateCertificate {
    fn validate(&self) -> Result<(), ApiError> {
        let mut v = Validator::new();
        v.opt_length("title", self.title.as_deref(), 2, 200)
            .opt_length("issuingOrganization", self.issuing_organization.as_deref(), 2, 150);
        if let Some(description) = &self.description {
            v.length("description", description, 0, 1000);
        }
        if let Some(issue_date) = self.issue_date {
            check_issue_date(&mut v, issue_date);
        }
        if let Some(path) = &self.certificate_path {
            check_path(&mut v, path);
        }
        v.finish()
    }

    fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(title) = &self.title {
            changes.push(("title", SqlValue::text(title.trim())));
        }
        if let Some(organization) = &self.issuing_organization {
            changes.push(("issuing_organization", SqlValue::text(organization.trim())));
        }
        if let Some(issue_date) = self.issue_date {
            changes.push(("issue_date", SqlValue::Date(issue_date)));
        }
        if self.description.is_some() {
            changes.push(("description", SqlValue::opt_text(blank_to_none(self.description.as_deref()))));
        }
        if let Some(path) = &self.certificate_path {
            changes.push(("certificate_path", SqlValue::text(path.trim())));
        }
        changes
    }
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CertificateStats {
    pub total: i64,
    pub students: i64,
}

impl Editable for Certificate {
    type Update = UpdateCertificate;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_trusted_hosts_are_accepted() {
        assert!(is_trusted_host("https://res.cloudinary.com/demo/raw/upload/cert.pdf"));
        assert!(is_trusted_host("https://drive.google.com/file/d/1abc/view"));
        assert!(is_trusted_host("https://trackademy.s3.amazonaws.com/cert.pdf"));
        assert!(!is_trusted_host("https://evil-cloudinary.com.attacker.io/cert.pdf"));
        assert!(!is_trusted_host("not a url"));
    }

    #[test]
    fn future_issue_dates_are_rejected() {
        let certificate = CreateCertificate {
            title: "AWS Cloud Practitioner".into(),
            issuing_organization: "Amazon Web Services".into(),
            issue_date: Utc::now().date_naive() + chrono::Duration::days(3),
            description: None,
            certificate_path: "https://www.dropbox.com/s/abc/cert.pdf".into(),
        };
        assert!(certificate.validate().is_err());
    }
}
