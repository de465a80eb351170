//! Domain models for the storefront.
//!
//! Row types decode straight from `SQLite` via `sqlx::FromRow`; the API
//! shapes returned to clients live next to them and serialize in camelCase.

pub mod category;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
