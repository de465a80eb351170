//! Core types for AutoCatalog.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod items;
pub mod pagination;
pub mod price;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use items::{LineItem, SyncItem, ViewedEntry, WishlistEntry, subtotal};
pub use pagination::{PageRequest, Pagination};
pub use price::{Discount, DiscountError};
pub use role::{Role, RoleSet};
pub use status::*;
