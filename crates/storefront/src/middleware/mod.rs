//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Cart session (give every visitor a session cart id)
//! 6. Rate limiting (governor, per route group)

pub mod auth;
pub mod cart_session;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    AuthRejection, CartSession, OptionalAuth, RequireAuth, clear_current_user, set_current_user,
};
pub use cart_session::cart_session_middleware;
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
