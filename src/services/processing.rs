use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::Duration;

use crate::config;
use crate::services::ServiceError;

/// Header the processing service reads its shared key from
pub const PROCESSING_KEY_HEADER: &str = "service-api-key";

/// Client for the external spreadsheet processing service.
#[derive(Debug, Clone)]
pub struct ProcessingClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ProcessingClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self { http, base_url: base_url.into().trim_end_matches('/').to_string(), api_key }
    }

    pub fn from_config() -> Self {
        let cfg = config::config();
        Self::new(
            cfg.services.processing_url.clone(),
            cfg.security.service_api_key.clone(),
            Duration::from_secs(cfg.services.request_timeout_secs),
        )
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Forward a faculty matrix workbook and return the parsed allocation tree
    pub async fn faculty_matrix(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        fields: &[(&str, String)],
    ) -> Result<Value, ServiceError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        let mut form = Form::new().part("file", part);
        for (name, value) in fields {
            form = form.text(name.to_string(), value.clone());
        }

        let url = self.endpoint("/api/v1/faculty-matrix");
        let mut request = self.http.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header(PROCESSING_KEY_HEADER, key);
        }

        tracing::info!(%url, "Forwarding faculty matrix to processing service");
        let response = request.send().await.map_err(|e| ServiceError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream { status: status.as_u16(), body });
        }
        response.json::<Value>().await.map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_cleanly() {
        let client = ProcessingClient::new("http://localhost:8001/", None, Duration::from_secs(5));
        assert_eq!(client.endpoint("/api/v1/faculty-matrix"), "http://localhost:8001/api/v1/faculty-matrix");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_request_error() {
        let client = ProcessingClient::new("http://127.0.0.1:9", None, Duration::from_millis(500));
        let err = client.faculty_matrix("m.xlsx", vec![1, 2, 3], &[]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Request(_)));
    }
}
