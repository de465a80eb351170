//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::SqlitePool;
use thiserror::Error;

/// Failure to reach the storefront database.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Open a pool on `AUTOCATALOG_DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConnectError` if the variable is unset or the database cannot be
/// opened.
pub async fn connect() -> Result<SqlitePool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("AUTOCATALOG_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("AUTOCATALOG_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(autocatalog_storefront::db::create_pool(&database_url).await?)
}
