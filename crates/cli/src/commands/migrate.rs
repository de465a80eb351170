//! Database migration command.
//!
//! ```bash
//! ac-cli migrate
//! ```
//!
//! Applies the migrations embedded from `crates/storefront/migrations/`. The
//! server applies the same set at start-up, so this is only needed to migrate
//! ahead of a deploy.

use sqlx::migrate::MigrateError;
use thiserror::Error;

use autocatalog_storefront::db;

use super::ConnectError;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Migration failed: {0}")]
    Migrate(#[from] MigrateError),
}

/// Apply pending storefront migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the database is unreachable or a migration
/// fails.
pub async fn run() -> Result<(), MigrationError> {
    let pool = super::connect().await?;

    tracing::info!("Running storefront migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
