//! Order management.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use autocatalog_core::{OrderId, OrderStatus, PageRequest, Pagination};

use super::write_error;
use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::order::OrderWithItems;
use crate::state::AppState;

/// Default page size of the admin order table.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// `?page=&limit=&status=`.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// `PATCH /api/admin/orders/{id}` body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// A page of orders.
#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<OrderWithItems>,
    pub pagination: Pagination,
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid order status: {raw}")))
}

/// Orders, newest first, optionally of one status.
#[instrument(skip(state, _admin))]
pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<OrderPage>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all")
        .map(parse_status)
        .transpose()?;
    let page = PageRequest::new(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let (orders, total) = OrderRepository::new(state.pool())
        .list(status, page)
        .await?;
    Ok(Json(OrderPage {
        orders,
        pagination: Pagination::new(page, total),
    }))
}

/// Move an order to another status.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.user.id))]
pub async fn update_status(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<OrderWithItems>> {
    let Json(body) = payload?;
    let status = body
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Status is required".to_owned()))
        .and_then(parse_status)?;

    let order = OrderRepository::new(state.pool())
        .update_status(&OrderId::new(id), status)
        .await
        .map_err(write_error("Order"))?;

    tracing::info!(order_id = %order.order.id, %status, "Order status changed");
    Ok(Json(order))
}
