//! Checkout.
//!
//! Charges the basket through the injected [`PaymentGateway`] and hands out
//! time-limited download links. Signed-in customers also get the order
//! recorded against their account.
//!
//! [`PaymentGateway`]: crate::services::PaymentGateway

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use autocatalog_core::{OrderStatus, PaymentMethod, ProductId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::OptionalSession;
use crate::models::order::{DownloadLink, NewOrder, NewOrderItem};
use crate::services::{ChargeRequest, PaymentError};
use crate::state::AppState;

/// One basket line as sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutItem {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
}

/// Contact details entered at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub email: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CustomerInfo {
    /// `name`, or first and last name joined.
    fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_owned());
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

/// `POST /api/checkout` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub customer_info: CustomerInfo,
}

/// Successful checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: String,
    pub transaction_id: String,
    pub download_links: Vec<DownloadLink>,
    pub message: &'static str,
}

/// Reject empty baskets and lines that cannot be charged.
fn validate_items(items: &[CheckoutItem]) -> Result<Vec<NewOrderItem>> {
    if items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_owned()));
    }
    items
        .iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q >= 1)
                .ok_or_else(|| AppError::BadRequest("Quantity must be at least 1".to_owned()))?;
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(AppError::BadRequest("Invalid item price".to_owned()));
            }
            Ok(NewOrderItem {
                product_id: item.id.clone(),
                name: item.name.clone(),
                quantity,
                price: item.price,
            })
        })
        .collect()
}

/// `ORD-<millis>-<4 random digits>`.
fn order_number() -> String {
    let suffix: u16 = rand::rng().random_range(1000..10000);
    format!("ORD-{}-{suffix}", Utc::now().timestamp_millis())
}

/// Charge the basket and issue download links.
#[instrument(skip(state, user, payload))]
pub async fn checkout(
    State(state): State<AppState>,
    OptionalSession(user): OptionalSession,
    payload: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = payload?;

    let lines = validate_items(&body.items)?;
    let method: PaymentMethod = body
        .payment_method
        .parse()
        .map_err(|_| AppError::BadRequest("Unsupported payment method".to_owned()))?;
    let amount: f64 = lines.iter().map(|l| l.price * f64::from(l.quantity)).sum();

    let customer_email = body
        .customer_info
        .email
        .clone()
        .or_else(|| user.as_ref().map(|u| u.email.to_string()));

    let charge = ChargeRequest {
        method,
        amount,
        customer_email: customer_email.clone(),
    };
    let receipt = match state.payments().charge(&charge).await {
        Ok(receipt) => receipt,
        Err(PaymentError::Declined(reason)) => {
            tracing::warn!(%reason, method = method.as_str(), amount, "Payment declined");
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": "Payment failed" })),
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let config = state.config();
    let expires_at = Utc::now() + Duration::days(i64::from(config.download_ttl_days));
    let download_links: Vec<DownloadLink> = lines
        .iter()
        .map(|line| DownloadLink {
            product_id: line.product_id.clone(),
            download_url: format!("{}/{}", config.download_base_url, line.product_id),
            expires_at,
        })
        .collect();

    let order_number = order_number();

    if let Some(user) = &user {
        let order = OrderRepository::new(state.pool())
            .create(&NewOrder {
                order_number: order_number.clone(),
                user_id: user.id.clone(),
                status: OrderStatus::Completed,
                total_amount: amount,
                payment_method: method,
                transaction_id: receipt.transaction_id.clone(),
                customer_email,
                customer_name: body.customer_info.display_name().or_else(|| user.name.clone()),
                download_links: download_links.clone(),
                items: lines,
            })
            .await?;
        tracing::info!(order_id = %order.order.id, %order_number, "Order recorded");
    }

    add_breadcrumb(
        "checkout",
        "Order completed",
        Some(&[("order_number", order_number.as_str()), ("method", method.as_str())]),
    );

    Ok(Json(CheckoutResponse {
        success: true,
        order_id: order_number,
        transaction_id: receipt.transaction_id,
        download_links,
        message: "Order completed successfully",
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64) -> CheckoutItem {
        CheckoutItem {
            id: ProductId::new("p1"),
            name: "EPC".to_owned(),
            price: 10.0,
            quantity,
        }
    }

    #[test]
    fn test_validate_items() {
        assert!(validate_items(&[]).is_err());
        assert!(validate_items(&[item(0)]).is_err());
        assert!(validate_items(&[item(-2)]).is_err());
        let lines = validate_items(&[item(3)]).unwrap_or_default();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|l| l.quantity), Some(3));
    }

    #[test]
    fn test_order_number_shape() {
        let number = order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first(), Some(&"ORD"));
        assert_eq!(parts.get(2).map(|s| s.len()), Some(4));
    }

    #[test]
    fn test_customer_name() {
        let info = CustomerInfo {
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            ..CustomerInfo::default()
        };
        assert_eq!(info.display_name().as_deref(), Some("Ada Lovelace"));
        assert_eq!(CustomerInfo::default().display_name(), None);
    }
}
