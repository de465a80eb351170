//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use autocatalog_core::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// A time-limited link to a purchased file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub product_id: ProductId,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

/// A `customer_order` row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub download_links: Json<Vec<DownloadLink>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An `order_item` row with the product's current download URL.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(skip)]
    pub order_id: OrderId,
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
    pub download_url: Option<String>,
}

/// An order together with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// One line of a new order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

/// Everything needed to record a paid order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: f64,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub download_links: Vec<DownloadLink>,
    pub items: Vec<NewOrderItem>,
}
