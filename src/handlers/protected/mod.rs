// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind jwt_auth_middleware. Role restrictions are
// attached per route in crate::routes; handlers that scope data by role
// (students seeing only their own rows) do so through the services.

pub mod academic_year;
pub mod assignment;
pub mod attendance;
pub mod auth;
pub mod course;
pub mod dashboard;
pub mod exam;
pub mod exam_result;
pub mod people;
pub mod resource;
pub mod student_records;
