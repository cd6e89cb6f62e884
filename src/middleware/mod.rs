pub mod auth;
pub mod extract;
pub mod response;
pub mod service_key;

pub use auth::{jwt_auth_middleware, require_roles, AuthUser, ADMIN_ONLY, FACULTY_ONLY, STAFF, STUDENT_ONLY};
pub use extract::{ApiJson, ApiPath, ApiQuery, ValidJson};
pub use response::{ApiResponse, ApiResult, Page, Pagination};
pub use service_key::service_key_middleware;
