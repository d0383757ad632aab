//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use prostore_storefront::config::{ConfigError, get_database_url};
use sqlx::PgPool;

/// Errors shared by every command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`), loading
/// `.env` first.
///
/// # Errors
///
/// Returns an error if the variable is unset or the database is unreachable.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    Ok(prostore_storefront::db::create_pool(&database_url).await?)
}
