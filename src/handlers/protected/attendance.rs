// handlers/protected/attendance.rs - Attendance by course and date, summaries and marking

use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, ValidJson};
use crate::models::attendance::{AttendanceEntry, CourseAttendance, MarkAttendance, UpdateAttendance};
use crate::models::{Attendance, Role};
use crate::services::attendance::AttendanceService;
use crate::services::people::PeopleService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDayQuery {
    pub course_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub student_id: Uuid,
    pub semester_id: Uuid,
}

/// GET /attendance?courseId&date
pub async fn for_course(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CourseDayQuery>,
) -> ApiResult<Vec<AttendanceEntry>> {
    let entries = AttendanceService::new(&state.db).for_course_on(query.course_id, query.date).await?;
    Ok(ApiResponse::success(entries))
}

/// GET /attendance/summary?studentId&semesterId
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<SummaryQuery>,
) -> ApiResult<Vec<CourseAttendance>> {
    if user.is(Role::Student) {
        let student = PeopleService::new(&state.db).current_student(&user).await?;
        if student.id != query.student_id {
            return Err(ApiError::forbidden("Students may only view their own attendance."));
        }
    }
    let summary = AttendanceService::new(&state.db).summary(query.student_id, query.semester_id).await?;
    Ok(ApiResponse::success(summary))
}

/// POST /attendance/mark - upserts one status per student
pub async fn mark(State(state): State<AppState>, ApiJson(input): ApiJson<MarkAttendance>) -> ApiResult<Vec<Attendance>> {
    Ok(ApiResponse::success(AttendanceService::new(&state.db).mark(&input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(input): ValidJson<UpdateAttendance>,
) -> ApiResult<Attendance> {
    Ok(ApiResponse::success(AttendanceService::new(&state.db).update(id, &input).await?))
}
