//! The wishlist store. Purely local; never mirrored to the server.

use std::sync::Arc;

use autocatalog_core::{ProductId, WishlistEntry};

use crate::storage::StorageSlot;
use crate::store::ItemStore;

/// Saved products, at most one entry per id.
pub struct WishlistStore {
    store: ItemStore<WishlistEntry>,
}

impl WishlistStore {
    pub const STORAGE_KEY: &'static str = "wishlist-storage";

    #[must_use]
    pub fn open(slot: Arc<dyn StorageSlot>) -> Self {
        Self {
            store: ItemStore::open(slot, Self::STORAGE_KEY),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistEntry] {
        self.store.items()
    }

    /// Append `entry` unless its id is already saved.
    pub fn add_item(&mut self, entry: WishlistEntry) {
        if self.store.contains(&entry.id) {
            return;
        }
        self.store.update(|items| items.push(entry));
    }

    pub fn remove_item(&mut self, id: &ProductId) {
        self.store.remove(id);
    }

    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.store.contains(id)
    }

    pub fn clear_wishlist(&mut self) {
        self.store.clear();
    }

    /// Number of saved entries.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.store.len()
    }
}
