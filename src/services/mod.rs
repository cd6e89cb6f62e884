pub mod academic_year;
pub mod assignment;
pub mod attendance;
pub mod auth;
pub mod course;
pub mod crud;
pub mod dashboard;
pub mod exam;
pub mod exam_result;
pub mod find;
pub mod mail;
pub mod people;
pub mod processing;
pub mod student_records;

use thiserror::Error;

use crate::error::ApiError;

pub use crud::{CrudService, ListParams};

/// Failures talking to collaborators outside the database
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request to processing service failed: {0}")]
    Request(String),

    #[error("Processing service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Processing service returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        tracing::error!("{}", err);
        match err {
            ServiceError::Mail(_) => ApiError::internal_server_error("Failed to send email."),
            _ => ApiError::bad_gateway("Error processing file with the external service."),
        }
    }
}
