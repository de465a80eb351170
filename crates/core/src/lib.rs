//! AutoCatalog Core - Shared types library.
//!
//! This crate provides common types used across all AutoCatalog components:
//! - `storefront` - Catalog, cart mirror, checkout, and admin HTTP API
//! - `client` - Persisted cart/wishlist/recently-viewed stores
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! on both sides of the wire.
//!
//! # Modules
//!
//! - [`types`] - IDs, roles, emails, catalog enums, line items, pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
