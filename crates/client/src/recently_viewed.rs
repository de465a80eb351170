//! Recently viewed products, most recent first.

use std::sync::Arc;

use autocatalog_core::{ProductId, ViewedEntry, WishlistEntry};
use chrono::{DateTime, Utc};

use crate::storage::StorageSlot;
use crate::store::ItemStore;

/// Bounded most-recent-first history of viewed products.
pub struct RecentlyViewedStore {
    store: ItemStore<ViewedEntry>,
}

impl RecentlyViewedStore {
    pub const STORAGE_KEY: &'static str = "recently-viewed-storage";

    /// Entries kept after any insert.
    pub const CAPACITY: usize = 20;

    /// Entries returned by [`recent`](Self::recent) when no limit is given.
    pub const DEFAULT_RECENT: usize = 10;

    #[must_use]
    pub fn open(slot: Arc<dyn StorageSlot>) -> Self {
        Self {
            store: ItemStore::open(slot, Self::STORAGE_KEY),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ViewedEntry] {
        self.store.items()
    }

    /// Record a view of `entry` now.
    pub fn add_item(&mut self, entry: WishlistEntry) {
        self.add_item_at(entry, Utc::now());
    }

    /// Record a view of `entry` at `viewed_at`, moving it to the front.
    pub fn add_item_at(&mut self, entry: WishlistEntry, viewed_at: DateTime<Utc>) {
        self.store.update(|items| {
            items.retain(|viewed| viewed.entry.id != entry.id);
            items.insert(0, ViewedEntry { entry, viewed_at });
            items.truncate(Self::CAPACITY);
        });
    }

    pub fn remove_item(&mut self, id: &ProductId) {
        self.store.remove(id);
    }

    pub fn clear_viewed(&mut self) {
        self.store.clear();
    }

    #[must_use]
    pub fn total_items(&self) -> usize {
        self.store.len()
    }

    /// The `limit` most recent entries (default 10).
    #[must_use]
    pub fn recent(&self, limit: Option<usize>) -> &[ViewedEntry] {
        let items = self.items();
        items
            .get(..limit.unwrap_or(Self::DEFAULT_RECENT))
            .unwrap_or(items)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::storage::MemoryStorage;

    fn entry(id: usize) -> WishlistEntry {
        WishlistEntry {
            id: ProductId::new(format!("p{id}")),
            name: format!("Service manual {id}"),
            price: 5.0,
            original_price: None,
            discount: None,
            image: None,
            rating: None,
            review_count: None,
        }
    }

    fn ids(store: &RecentlyViewedStore) -> Vec<&str> {
        store.items().iter().map(|v| v.entry.id.as_str()).collect()
    }

    #[test]
    fn test_capped_at_capacity() {
        let mut viewed = RecentlyViewedStore::open(Arc::new(MemoryStorage::new()));
        for i in 0..35 {
            viewed.add_item(entry(i));
            assert!(viewed.total_items() <= RecentlyViewedStore::CAPACITY);
        }

        assert_eq!(viewed.total_items(), 20);
        assert_eq!(ids(&viewed)[0], "p34");
        assert_eq!(ids(&viewed)[19], "p15");
    }

    #[test]
    fn test_re_view_moves_to_front_and_refreshes_timestamp() {
        let mut viewed = RecentlyViewedStore::open(Arc::new(MemoryStorage::new()));
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        viewed.add_item_at(entry(1), start);
        viewed.add_item_at(entry(2), start + TimeDelta::minutes(1));
        viewed.add_item_at(entry(3), start + TimeDelta::minutes(2));

        let later = start + TimeDelta::minutes(10);
        viewed.add_item_at(entry(1), later);

        assert_eq!(ids(&viewed), vec!["p1", "p3", "p2"]);
        assert_eq!(viewed.items()[0].viewed_at, later);
    }

    #[test]
    fn test_recent_limit_and_default() {
        let mut viewed = RecentlyViewedStore::open(Arc::new(MemoryStorage::new()));
        for i in 0..15 {
            viewed.add_item(entry(i));
        }

        assert_eq!(viewed.recent(None).len(), 10);
        assert_eq!(viewed.recent(Some(3)).len(), 3);
        assert_eq!(viewed.recent(Some(50)).len(), 15);
        assert_eq!(viewed.recent(Some(15)).len(), 15);
        assert!(viewed.recent(Some(0)).is_empty());

        viewed.remove_item(&ProductId::new("p14"));
        assert_eq!(viewed.recent(Some(1))[0].entry.id.as_str(), "p13");

        viewed.clear_viewed();
        assert!(viewed.recent(None).is_empty());
    }
}
