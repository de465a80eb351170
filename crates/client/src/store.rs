//! The persisted item store shared by cart, wishlist and recently-viewed.
//!
//! An `ItemStore` is an ordered collection deduplicated by product id. It
//! loads its slot when opened and writes the full collection back after
//! every mutation. Write failures are logged and otherwise ignored: the
//! in-memory state is always the source of truth for the running process.

use std::sync::Arc;

use autocatalog_core::{LineItem, ProductId, ViewedEntry, WishlistEntry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::StorageSlot;

/// Items addressable by product id.
pub trait Keyed {
    /// The product id this item refers to.
    fn key(&self) -> &ProductId;
}

impl Keyed for LineItem {
    fn key(&self) -> &ProductId {
        &self.id
    }
}

impl Keyed for WishlistEntry {
    fn key(&self) -> &ProductId {
        &self.id
    }
}

impl Keyed for ViewedEntry {
    fn key(&self) -> &ProductId {
        &self.entry.id
    }
}

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    items: &'a [T],
}

#[derive(Deserialize)]
struct Document<T> {
    items: Vec<T>,
}

/// Ordered, id-deduplicated items mirrored to a storage slot.
pub struct ItemStore<T> {
    name: &'static str,
    slot: Arc<dyn StorageSlot>,
    items: Vec<T>,
}

impl<T> ItemStore<T>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    /// Open the store named `name`, restoring whatever the slot holds.
    ///
    /// A missing or unreadable document yields an empty store.
    #[must_use]
    pub fn open(slot: Arc<dyn StorageSlot>, name: &'static str) -> Self {
        let items = match slot.load(name) {
            Ok(Some(document)) => match serde_json::from_str::<Document<T>>(&document) {
                Ok(doc) => doc.items,
                Err(e) => {
                    tracing::warn!(store = name, error = %e, "discarding unreadable store document");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(store = name, error = %e, "failed to read store slot");
                Vec::new()
            }
        };

        Self { name, slot, items }
    }

    /// Storage slot name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Current items in order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of entries (not quantities).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the entry for `id`.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&T> {
        self.items.iter().find(|item| item.key() == id)
    }

    /// Whether an entry for `id` exists.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Apply `f` to the collection, then persist.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = f(&mut self.items);
        self.persist();
        result
    }

    /// Drop the entry for `id`; absent ids are not an error.
    pub fn remove(&mut self, id: &ProductId) {
        self.update(|items| items.retain(|item| item.key() != id));
    }

    /// Replace the whole collection.
    pub fn replace(&mut self, items: Vec<T>) {
        self.update(|current| *current = items);
    }

    /// Empty the collection.
    pub fn clear(&mut self) {
        self.update(Vec::clear);
    }

    fn persist(&self) {
        let document = match serde_json::to_string(&DocumentRef { items: &self.items }) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(store = self.name, error = %e, "failed to serialize store");
                return;
            }
        };

        if let Err(e) = self.slot.save(self.name, &document) {
            tracing::warn!(store = self.name, error = %e, "failed to persist store");
        }
    }
}
