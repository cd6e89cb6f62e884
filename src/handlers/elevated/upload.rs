// handlers/elevated/upload.rs - POST /api/v1/upload/* Excel imports

use axum::extract::{Multipart, State};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::{AttendanceForm, FormFields, ImportSummary, MatrixForm, ResultsForm, UploadError, UploadService};

/// The `file` part and every text field of a multipart upload
pub struct UploadedWorkbook {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub fields: FormFields,
}

impl UploadedWorkbook {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut file: Option<(String, Vec<u8>)> = None;
        let mut fields = FormFields::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e.body_text())))?
        {
            let Some(name) = field.name().map(str::to_string) else { continue };
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read the uploaded file: {}", e.body_text())))?;
                file = Some((file_name, bytes.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read field '{}': {}", name, e.body_text())))?;
                fields.insert(name, value);
            }
        }

        match file {
            Some((file_name, bytes)) if !bytes.is_empty() => {
                tracing::info!(file_name = %file_name, size = bytes.len(), "Received workbook upload");
                Ok(Self { file_name, bytes, fields })
            }
            _ => Err(UploadError::MissingFile.into()),
        }
    }
}

pub async fn faculty(State(state): State<AppState>, multipart: Multipart) -> ApiResult<ImportSummary> {
    let upload = UploadedWorkbook::read(multipart).await?;
    let summary = UploadService::new(&state.db, state.mailer.as_ref()).faculty(&upload.bytes).await?;
    Ok(ApiResponse::created(summary))
}

pub async fn students(State(state): State<AppState>, multipart: Multipart) -> ApiResult<ImportSummary> {
    let upload = UploadedWorkbook::read(multipart).await?;
    let summary = UploadService::new(&state.db, state.mailer.as_ref()).students(&upload.bytes).await?;
    Ok(ApiResponse::created(summary))
}

pub async fn subjects(State(state): State<AppState>, multipart: Multipart) -> ApiResult<ImportSummary> {
    let upload = UploadedWorkbook::read(multipart).await?;
    let summary = UploadService::new(&state.db, state.mailer.as_ref()).subjects(&upload.bytes).await?;
    Ok(ApiResponse::created(summary))
}

/// Forwarded to the processing service; its allocations become courses
pub async fn faculty_matrix(State(state): State<AppState>, multipart: Multipart) -> ApiResult<ImportSummary> {
    let upload = UploadedWorkbook::read(multipart).await?;
    let form = MatrixForm::parse(&upload.fields)?;
    let summary = UploadService::new(&state.db, state.mailer.as_ref())
        .faculty_matrix(&state.processing, &form, &upload.file_name, upload.bytes)
        .await?;
    Ok(ApiResponse::created(summary))
}

pub async fn results(State(state): State<AppState>, multipart: Multipart) -> ApiResult<ImportSummary> {
    let upload = UploadedWorkbook::read(multipart).await?;
    let form = ResultsForm::parse(&upload.fields)?;
    let summary = UploadService::new(&state.db, state.mailer.as_ref()).results(&form, &upload.bytes).await?;
    Ok(ApiResponse::created(summary))
}

pub async fn attendance(State(state): State<AppState>, multipart: Multipart) -> ApiResult<ImportSummary> {
    let upload = UploadedWorkbook::read(multipart).await?;
    let form = AttendanceForm::parse(&upload.fields)?;
    let summary = UploadService::new(&state.db, state.mailer.as_ref()).attendance(&form, &upload.bytes).await?;
    Ok(ApiResponse::created(summary))
}
