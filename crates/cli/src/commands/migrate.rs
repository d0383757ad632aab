//! Database migrations.
//!
//! Applies `crates/storefront/migrations/` (store schema, orders, reviews and
//! both session tables) to the storefront database. The migrations are
//! embedded at compile time.

use super::{CommandError, connect};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run every pending migration.
///
/// # Errors
///
/// Returns an error if the connection fails or a migration cannot be applied.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    let migrator = sqlx::migrate!("../storefront/migrations");
    tracing::info!(count = migrator.iter().count(), "Running migrations...");
    migrator.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
