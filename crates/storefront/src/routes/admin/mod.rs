//! Admin API under `/api/admin`.
//!
//! Every handler takes a [`RequireAdmin`] or [`RequireSuperAdmin`] extractor
//! as its first argument, so the gate rejects a request before the handler
//! body touches storage.
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin
//! [`RequireSuperAdmin`]: crate::middleware::RequireSuperAdmin

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, patch},
};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::state::AppState;

/// Create the admin API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::index).post(categories::create))
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::destroy),
        )
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route("/users", get(users::index).patch(users::update_role))
        .route("/users/{id}", delete(users::destroy))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", patch(orders::update_status))
}

/// Translate a failed write on `entity` into the client-facing error.
///
/// Uniqueness violations name the entity and field, e.g.
/// `"Product slug must be unique"`.
pub(crate) fn write_error(entity: &'static str) -> impl Fn(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::Conflict(field) => {
            AppError::BadRequest(format!("{entity} {field} must be unique"))
        }
        RepositoryError::ForeignKey(reference) => {
            AppError::BadRequest(format!("Unknown {reference}"))
        }
        RepositoryError::NotFound => AppError::NotFound(format!("{entity} not found")),
        other => AppError::Database(other),
    }
}

/// Trimmed, non-empty text.
pub(crate) fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_messages() {
        let to_error = write_error("Product");
        assert!(matches!(
            to_error(RepositoryError::Conflict("slug".to_owned())),
            AppError::BadRequest(msg) if msg == "Product slug must be unique"
        ));
        assert!(matches!(
            to_error(RepositoryError::ForeignKey("category".to_owned())),
            AppError::BadRequest(msg) if msg == "Unknown category"
        ));
        assert!(matches!(
            to_error(RepositoryError::NotFound),
            AppError::NotFound(msg) if msg == "Product not found"
        ));
    }

    #[test]
    fn test_present() {
        assert_eq!(present(Some("  x ")).as_deref(), Some("x"));
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
    }
}
