// handlers/elevated/mod.rs - ADMIN-only handlers
//
// Mounted behind jwt_auth_middleware plus require_roles(ADMIN_ONLY).

pub mod auth;
pub mod find;
pub mod upload;
