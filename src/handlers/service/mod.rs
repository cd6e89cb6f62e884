// handlers/service/mod.rs - Callbacks from the processing service (x-api-key)

use axum::extract::State;
use serde_json::{json, Value};

use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

fn payload_size(payload: &Value) -> usize {
    match payload {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        Value::Null => 0,
        _ => 1,
    }
}

/// POST /api/v1/service/process-results
pub async fn process_results(caller: AuthUser, ApiJson(payload): ApiJson<Value>) -> ApiResult<Value> {
    tracing::info!(caller = %caller.email, entries = payload_size(&payload), "Received processed results");
    Ok(ApiResponse::success(json!({ "message": "Results processed successfully" })))
}

/// POST /api/v1/service/process-faculty-matrix
pub async fn process_faculty_matrix(caller: AuthUser, ApiJson(payload): ApiJson<Value>) -> ApiResult<Value> {
    tracing::info!(caller = %caller.email, entries = payload_size(&payload), "Received processed faculty matrix");
    Ok(ApiResponse::success(json!({ "message": "Faculty matrix processed successfully" })))
}

/// GET /api/v1/service/health
pub async fn health(State(state): State<AppState>) -> ApiResult<Value> {
    let database = if state.db.health_check().await.is_ok() { "ok" } else { "unavailable" };
    Ok(ApiResponse::success(json!({
        "status": "ok",
        "service": "trackademy-api",
        "database": database,
        "timestamp": chrono::Utc::now(),
    })))
}
