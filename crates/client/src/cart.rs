//! The cart store.
//!
//! Every mutation is applied to the in-memory list and persisted before the
//! method returns. When a mirror is attached, a snapshot of the resulting
//! list is then pushed to the server in the background. Pushes from one
//! store are chained so they reach the server in mutation order.

use std::sync::Arc;

use autocatalog_core::{LineItem, ProductId, subtotal};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::ClientResult;
use crate::mirror::CartMirror;
use crate::storage::StorageSlot;
use crate::store::ItemStore;

/// Product fields needed to put something in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRef {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
}

impl ProductRef {
    #[must_use]
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            image: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Cart line items, persisted locally and mirrored to the server.
pub struct CartStore {
    store: ItemStore<LineItem>,
    mirror: Option<Arc<dyn CartMirror>>,
    last_push: Option<JoinHandle<()>>,
}

impl CartStore {
    /// Storage slot name.
    pub const STORAGE_KEY: &'static str = "auth-cart-storage";

    /// Restore the cart from `slot`. No mirror is attached.
    #[must_use]
    pub fn open(slot: Arc<dyn StorageSlot>) -> Self {
        Self {
            store: ItemStore::open(slot, Self::STORAGE_KEY),
            mirror: None,
            last_push: None,
        }
    }

    /// Mirror every subsequent mutation to `mirror`.
    #[must_use]
    pub fn with_mirror(mut self, mirror: Arc<dyn CartMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        self.store.items()
    }

    /// Add one unit of `product`, merging with an existing line.
    pub fn add_item(&mut self, product: ProductRef) {
        self.store.update(|items| {
            if let Some(existing) = items.iter_mut().find(|item| item.id == product.id) {
                existing.quantity = existing.quantity.saturating_add(1);
            } else {
                items.push(LineItem {
                    id: product.id,
                    name: product.name,
                    price: product.price,
                    quantity: 1,
                    image: product.image,
                });
            }
        });
        self.sync_with_server();
    }

    pub fn remove_item(&mut self, id: &ProductId) {
        self.store.remove(id);
        self.sync_with_server();
    }

    /// Set the quantity of `id`. Zero or negative removes the line; values
    /// above `u32::MAX` are stored as `u32::MAX`, the most a line can hold.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.store.update(|items| {
            if let Some(item) = items.iter_mut().find(|item| &item.id == id) {
                item.quantity = quantity;
            }
        });
        self.sync_with_server();
    }

    /// Empty the cart locally and on the server.
    pub fn clear_cart(&mut self) {
        self.store.clear();
        self.sync_with_server();
    }

    /// Sum of quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items().iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// `Σ price·quantity`, recomputed on every call.
    #[must_use]
    pub fn total_price(&self) -> f64 {
        subtotal(self.items())
    }

    /// Push a snapshot of the current items without waiting for the result.
    ///
    /// Skipped when no mirror is attached or when called outside a tokio
    /// runtime. Push failures are logged and dropped.
    pub fn sync_with_server(&mut self) {
        let Some(mirror) = self.mirror.clone() else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            tracing::debug!("no async runtime, skipping cart sync");
            return;
        };

        let snapshot = self.items().to_vec();
        let previous = self.last_push.take();
        self.last_push = Some(handle.spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            let count = snapshot.len();
            match mirror.push(snapshot).await {
                Ok(()) => tracing::debug!(items = count, "cart synced"),
                Err(e) => tracing::warn!(error = %e, "cart sync failed"),
            }
        }));
    }

    /// Wait for outstanding pushes to finish.
    pub async fn flush(&mut self) {
        let Some(push) = self.last_push.take() else {
            return;
        };
        if let Err(e) = push.await {
            tracing::error!(error = %e, "cart sync task failed");
        }
    }

    /// Replace the local cart with the server's copy.
    ///
    /// Outstanding pushes are flushed first so the fetch observes them.
    /// Without a mirror this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the mirror's error; the local cart is left untouched.
    pub async fn load_from_server(&mut self) -> ClientResult<()> {
        let Some(mirror) = self.mirror.clone() else {
            return Ok(());
        };
        self.flush().await;

        match mirror.fetch().await {
            Ok(items) => {
                tracing::debug!(items = items.len(), "cart loaded from server");
                self.store.replace(items);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load cart from server");
                Err(e)
            }
        }
    }
}
