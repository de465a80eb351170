//! AutoCatalog client state engine.
//!
//! The storefront keeps three pieces of per-browser state: the cart, the
//! wishlist, and the recently-viewed list. Each lives in a
//! [`store::ItemStore`] that owns its serialization boundary: it loads its
//! slot once when opened and rewrites the slot after every mutation.
//!
//! Only the cart reaches the server. Every cart mutation snapshots the full
//! item list and pushes it through a [`mirror::CartMirror`] without waiting
//! for the result; the server replaces its copy wholesale, so the last push
//! to arrive wins.
//!
//! # Example
//!
//! ```rust,no_run
//! use autocatalog_client::{ClientConfig, ProductRef, StoreSet};
//!
//! # async fn demo() -> autocatalog_client::ClientResult<()> {
//! let config = ClientConfig::new("http://localhost:3000", "./.autocatalog");
//! let mut stores = StoreSet::open(&config)?;
//! stores.cart.add_item(ProductRef::new("prod-1", "Workshop manual", 49.0));
//! stores.cart.flush().await;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod mirror;
pub mod recently_viewed;
pub mod storage;
pub mod store;
pub mod totals;
pub mod wishlist;

use std::sync::Arc;

pub use cart::{CartStore, ProductRef};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use mirror::{CartMirror, HttpCartMirror};
pub use recently_viewed::RecentlyViewedStore;
pub use storage::{FileStorage, MemoryStorage, StorageSlot};
pub use totals::{AppliedCoupon, CartSummary, CouponError, CouponTable};
pub use wishlist::WishlistStore;

/// The three stores of one browser profile, wired to the same storage and
/// (for the cart) to the server mirror.
pub struct StoreSet {
    pub cart: CartStore,
    pub wishlist: WishlistStore,
    pub recently_viewed: RecentlyViewedStore,
    pub mirror: Arc<HttpCartMirror>,
}

impl StoreSet {
    /// Open all stores from `config.storage_dir` and connect the cart to the
    /// storefront at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn open(config: &ClientConfig) -> ClientResult<Self> {
        let slot: Arc<dyn StorageSlot> = Arc::new(FileStorage::new(&config.storage_dir)?);
        let mirror = Arc::new(HttpCartMirror::new(config)?);

        Ok(Self {
            cart: CartStore::open(Arc::clone(&slot)).with_mirror(mirror.clone()),
            wishlist: WishlistStore::open(Arc::clone(&slot)),
            recently_viewed: RecentlyViewedStore::open(slot),
            mirror,
        })
    }
}
