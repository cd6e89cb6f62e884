// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT, role checked per route) → Elevated (ADMIN JWT)
// → Service (shared x-api-key, machine to machine)
//
// Handlers stay thin: extract, call a service, wrap the result in ApiResponse.
// Routing and the role guards live in crate::routes.

pub mod elevated; // ADMIN-only operations: imports, raw finds, account administration
pub mod protected; // Everything behind a bearer token
pub mod public; // Login, bootstrap registration, root and health
pub mod service; // Callbacks from the processing service
