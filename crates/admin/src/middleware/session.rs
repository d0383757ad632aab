//! Session middleware configuration for the back office.
//!
//! Same `PostgreSQL` store as the storefront but a separate table, cookie name
//! and a `SameSite=Strict` cookie with a 24 hour inactivity expiry.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for the back office.
pub const SESSION_COOKIE_NAME: &str = "prostore_admin_session";

/// Session table in the `tower_sessions` schema.
const SESSION_TABLE: &str = "admin_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with the `PostgreSQL` store.
///
/// # Panics
///
/// Never: the table name is a valid identifier constant.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone())
        .with_table_name(SESSION_TABLE)
        .expect("valid table name");
    session_layer(store, config.is_secure())
}

/// Session layer over any store.
#[must_use]
pub fn session_layer<S: SessionStore>(store: S, is_secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
