//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin, or promote the existing account with that email
//! ac-cli admin create -e admin@example.com -n "Admin Name" -p "long-password" -r admin
//!
//! # Change the role of an existing account
//! ac-cli admin promote -e admin@example.com -r super_admin
//! ```
//!
//! # Environment Variables
//!
//! - `AUTOCATALOG_DATABASE_URL` - `SQLite` connection string

use sqlx::SqlitePool;
use thiserror::Error;

use autocatalog_core::{Email, EmailError, Role};
use autocatalog_storefront::db::{RepositoryError, UserRepository};
use autocatalog_storefront::models::user::User;
use autocatalog_storefront::services::{AuthError, AuthService};

use super::ConnectError;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin, super_admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// No account has this email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),

    /// Registration rejected the input (e.g. a short password).
    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What `create_user` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    Promoted,
}

fn parse_role(role: &str) -> Result<Role, AdminError> {
    role.parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// Create an account with `role`, or move the existing account with that
/// email to `role`. The password of an existing account is left alone.
///
/// # Errors
///
/// Returns `AdminError` for an invalid role, email or password, or if the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<(), AdminError> {
    let role = parse_role(role)?;
    let pool = super::connect().await?;

    let (user, outcome) = provision(&pool, email, name, password, role).await?;
    match outcome {
        Provisioned::Created => {
            tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "User created");
        }
        Provisioned::Promoted => {
            tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Existing user promoted");
        }
    }
    Ok(())
}

/// Change the role of the account with `email`.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has that email.
pub async fn promote(email: &str, role: &str) -> Result<(), AdminError> {
    let role = parse_role(role)?;
    let pool = super::connect().await?;

    let user = set_role(&pool, email, role).await?;
    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Role changed");
    Ok(())
}

/// Create-or-promote against an open pool.
async fn provision(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password: &str,
    role: Role,
) -> Result<(User, Provisioned), AdminError> {
    let parsed = Email::parse(email)?;
    let users = UserRepository::new(pool);

    if let Some(existing) = users.get_by_email(&parsed).await? {
        let user = users.update_role(&existing.id, role).await?;
        return Ok((user, Provisioned::Promoted));
    }

    let name = Some(name.trim()).filter(|n| !n.is_empty());
    let user = AuthService::new(pool)
        .register(name, email, password, role)
        .await?;
    Ok((user, Provisioned::Created))
}

async fn set_role(pool: &SqlitePool, email: &str, role: Role) -> Result<User, AdminError> {
    let parsed = Email::parse(email)?;
    let users = UserRepository::new(pool);

    let existing = users
        .get_by_email(&parsed)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_owned()))?;
    Ok(users.update_role(&existing.id, role).await?)
}
