// handlers/public/system.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service name, version and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Trackademy API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Academic records for colleges, departments, students and faculty",
            "endpoints": {
                "health": "/health (public)",
                "auth": "/api/v1/auth/* (login public, rest protected)",
                "entities": "/api/v1/{colleges,academic-years,departments,semesters,divisions,subjects,faculties,students,courses,exams} (protected)",
                "results": "/api/v1/exam-results, /api/v1/analytics/results (protected)",
                "attendance": "/api/v1/attendance (protected)",
                "assignments": "/api/v1/assignments, /api/v1/submissions (protected)",
                "records": "/api/v1/internships, /api/v1/certificates (protected)",
                "dashboard": "/api/v1/dashboard/summary (protected)",
                "find": "/api/v1/find/:resource (admin)",
                "upload": "/api/v1/upload/* (admin)",
                "service": "/api/v1/service/* (x-api-key)",
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": true,
                    "code": "SERVICE_UNAVAILABLE",
                    "message": "Database unavailable",
                    "data": { "status": "degraded", "timestamp": now, "database": "unavailable" }
                })),
            )
        }
    }
}
