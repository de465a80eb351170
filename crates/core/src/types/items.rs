//! Client-side line items shared by the stores and the cart API.
//!
//! All three item kinds are keyed by the product id; a store never holds two
//! entries with the same `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product reference plus quantity held in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product id.
    pub id: ProductId,
    pub name: String,
    /// Unit price, `>= 0`.
    pub price: f64,
    /// Always `>= 1` while the item is in a cart.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// `Σ price·quantity` over `items`; `0.0` for an empty slice.
#[must_use]
pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::line_total).sum()
}

/// One entry of the server cart sync payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl From<&LineItem> for SyncItem {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.id.clone(),
            quantity: i64::from(item.quantity),
        }
    }
}

/// A saved product in the wishlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    /// Product id.
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    /// Display label such as `"15%"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

/// A wishlist-shaped entry stamped with when it was last viewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewedEntry {
    #[serde(flatten)]
    pub entry: WishlistEntry,
    pub viewed_at: DateTime<Utc>,
}
