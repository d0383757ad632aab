//! HTTP middleware stack for the back office.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (shared with the storefront)
//! 4. Session layer (tower-sessions, `SameSite=Strict`)
//!
//! Every route except sign-in and health checks takes [`RequireAdmin`].

pub mod auth;
pub mod session;

pub use auth::{
    AdminAuthRejection, RequireAdmin, check_admin, clear_current_admin, set_current_admin,
};
pub use session::create_session_layer;
