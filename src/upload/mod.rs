pub mod forms;
pub mod matrix;
pub mod results;
pub mod rows;
pub mod service;
pub mod sheet;

use serde::Serialize;
use thiserror::Error;

use crate::error::ApiError;

pub use forms::{AttendanceForm, FormFields, MatrixForm, ResultsForm};
pub use service::UploadService;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No Excel file was uploaded.")]
    MissingFile,

    #[error("The uploaded file could not be read as an Excel workbook: {0}")]
    Workbook(String),

    #[error("The uploaded workbook has no data.")]
    MissingSheet,

    #[error("{0}")]
    Layout(String),

    #[error("Missing or invalid form field '{0}'.")]
    Field(&'static str),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        tracing::warn!("Rejected upload: {}", err);
        ApiError::bad_request(err.to_string())
    }
}

/// Body of every import response
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub message: String,
    pub created_count: usize,
    pub skipped_count: usize,
}

/// Running counts for one import
#[derive(Debug, Default)]
pub struct Tally {
    created: usize,
    skipped: usize,
}

impl Tally {
    pub fn created(&mut self) {
        self.created += 1;
    }

    pub fn add_created(&mut self, count: usize) {
        self.created += count;
    }

    pub fn skip(&mut self, row: usize, reason: impl AsRef<str>) {
        tracing::warn!(row, reason = reason.as_ref(), "Skipped import row");
        self.skipped += 1;
    }

    /// Skip something that has no sheet row, such as a matrix allocation
    pub fn skip_entry(&mut self, entry: &str, reason: impl AsRef<str>) {
        tracing::warn!(entry, reason = reason.as_ref(), "Skipped import entry");
        self.skipped += 1;
    }

    pub fn finish(self, what: &str) -> ImportSummary {
        tracing::info!(created = self.created, skipped = self.skipped, "{} import finished", what);
        ImportSummary {
            message: format!("{} imported successfully.", what),
            created_count: self.created,
            skipped_count: self.skipped,
        }
    }
}

/// Readable reason for a row that the database or validation refused
pub fn describe(err: &ApiError) -> String {
    match err {
        ApiError::ValidationError { field_errors: Some(fields), .. } if !fields.is_empty() => {
            let mut parts: Vec<String> = fields.iter().map(|(field, msg)| format!("{}: {}", field, msg)).collect();
            parts.sort();
            parts.join("; ")
        }
        other => other.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn tally_counts_rows() {
        let mut tally = Tally::default();
        tally.created();
        tally.add_created(2);
        tally.skip(4, "duplicate email");
        let summary = tally.finish("Faculty data");
        assert_eq!(summary.created_count, 3);
        assert_eq!(summary.skipped_count, 1);
        assert_eq!(summary.message, "Faculty data imported successfully.");
        let body = serde_json::to_value(&summary).unwrap();
        assert_eq!(body["createdCount"], 3);
    }

    #[test]
    fn upload_errors_are_bad_requests() {
        let err = ApiError::from(UploadError::MissingFile);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "No Excel file was uploaded.");
    }

    #[test]
    fn describe_lists_field_errors() {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "Please provide a valid email address.".to_string());
        let err = ApiError::validation_error("Validation failed.", Some(fields));
        assert_eq!(describe(&err), "email: Please provide a valid email address.");
        assert_eq!(describe(&ApiError::conflict("Email already exists.")), "Email already exists.");
    }
}
