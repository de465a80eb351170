//! Database operations for the storefront `SQLite` database.
//!
//! ## Tables
//!
//! - `user` - Accounts and their role
//! - `category` - Category tree (`parent_id` self reference)
//! - `product` - Catalog entries, each in exactly one category
//! - `cart_item` - Server copy of each user's cart, replaced wholesale on sync
//! - `wishlist_item` - Saved products per user
//! - `customer_order`, `order_item` - Completed checkouts
//! - `tower_sessions` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p autocatalog-cli -- migrate
//! ```

pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use cart::CartRepository;
pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Embedded storefront migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A referenced row does not exist.
    #[error("missing reference: {0}")]
    ForeignKey(String),
}

impl RepositoryError {
    /// Translate constraint violations from a write into typed errors.
    ///
    /// `unique` names the field that a unique violation refers to, `reference`
    /// the row a foreign key violation refers to.
    #[must_use]
    pub fn from_write(err: sqlx::Error, unique: &str, reference: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(unique.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::ForeignKey(reference.to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool, creating the database file if needed.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options: SqliteConnectOptions = database_url.expose_secret().parse()?;

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options.create_if_missing(true).foreign_keys(true))
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every `sqlite::memory:` connection is its own database, so the pool holds
/// exactly one connection and never recycles it.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Apply pending storefront migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wrap the
/// term for substring matching.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for repository tests.

    use autocatalog_core::{CategoryId, Discount, ProductType, Role, UserId};
    use sqlx::SqlitePool;

    use super::*;
    use crate::models::category::NewCategory;
    use crate::models::product::{NewProduct, ProductDetails};

    /// A migrated in-memory database.
    #[allow(clippy::unwrap_used)]
    pub async fn pool() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        migrate(&pool).await.unwrap();
        pool
    }

    #[allow(clippy::unwrap_used)]
    pub async fn category(pool: &SqlitePool, slug: &str) -> CategoryId {
        CategoryRepository::new(pool)
            .create(&NewCategory {
                name: slug.to_uppercase(),
                slug: slug.to_owned(),
                description: None,
                image: None,
                parent_id: None,
            })
            .await
            .unwrap()
            .id
    }

    pub fn new_product(slug: &str, category_id: &CategoryId, price: f64) -> NewProduct {
        NewProduct {
            name: format!("Manual {slug}"),
            slug: slug.to_owned(),
            description: None,
            price,
            discount: Discount::NONE,
            images: Vec::new(),
            details: ProductDetails::default(),
            product_type: ProductType::RepairManual,
            category_id: category_id.clone(),
            is_active: true,
            featured: false,
        }
    }

    #[allow(clippy::unwrap_used)]
    pub async fn user(pool: &SqlitePool, email: &str) -> UserId {
        let email = autocatalog_core::Email::parse(email).unwrap();
        UserRepository::new(pool)
            .create(&email, Some("Test User"), "not-a-real-hash", Role::User)
            .await
            .unwrap()
            .id
    }
}
