//! Account handlers for the signed-in user.
//!
//! Wishlist, order history, dashboard stats and activity, and the profile.
//! Every handler requires a session of any role.

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use autocatalog_core::{OrderStatus, ProductId, WishlistItemId};

use crate::db::wishlist::WishlistItem;
use crate::db::{OrderRepository, UserRepository, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireSession, set_current_user};
use crate::models::CurrentUser;
use crate::models::order::{OrderItem, OrderWithItems};
use crate::models::user::User;
use crate::services::auth::ProfileChange;
use crate::services::AuthService;
use crate::state::AppState;

/// Orders shown in the activity feed.
const ACTIVITY_ORDERS: u32 = 5;
/// Wishlist additions shown in the activity feed.
const ACTIVITY_WISHLIST: u32 = 3;
/// Length of the activity feed.
const ACTIVITY_LEN: usize = 5;

// =============================================================================
// Wishlist
// =============================================================================

/// `POST /api/user/wishlist` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWishlistRequest {
    pub product_id: Option<String>,
}

/// `DELETE /api/user/wishlist?itemId=`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveWishlistQuery {
    pub item_id: Option<String>,
}

/// The user's saved products, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn wishlist(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
) -> Result<Json<Vec<WishlistItem>>> {
    let items = WishlistRepository::new(state.pool())
        .list(&user.id, None)
        .await?;
    Ok(Json(items))
}

/// Save a product. Saving it again returns the existing entry.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    payload: std::result::Result<Json<AddWishlistRequest>, JsonRejection>,
) -> Result<Json<WishlistItem>> {
    let Json(body) = payload?;
    let product_id = body
        .product_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;

    let item = WishlistRepository::new(state.pool())
        .add(&user.id, &ProductId::new(product_id))
        .await?;
    Ok(Json(item))
}

/// Remove one of the user's wishlist entries.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    Query(query): Query<RemoveWishlistQuery>,
) -> Result<Json<Value>> {
    let item_id = query
        .item_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Item ID is required".to_owned()))?;

    let removed = WishlistRepository::new(state.pool())
        .remove(&user.id, &WishlistItemId::new(item_id))
        .await?;
    if !removed {
        return Err(AppError::NotFound("Wishlist item not found".to_owned()));
    }
    Ok(Json(json!({ "success": true })))
}

// =============================================================================
// Orders
// =============================================================================

/// One line of an order in the account history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
    pub download_url: Option<String>,
}

/// An order as listed in the account history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// The human-facing order number.
    pub id: String,
    /// `"<first item>"` or `"<first item> + N more"`.
    pub product: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub status: OrderStatus,
    /// `"$x.xx"`.
    pub amount: String,
    /// Only for completed orders.
    pub download_link: Option<String>,
    pub items: Vec<OrderLineView>,
}

impl From<OrderWithItems> for OrderSummary {
    fn from(OrderWithItems { order, items }: OrderWithItems) -> Self {
        let download_link = (order.status == OrderStatus::Completed).then(|| {
            order.download_links.0.first().map_or_else(
                || format!("/downloads/order-{}", order.id),
                |link| link.download_url.clone(),
            )
        });

        Self {
            product: describe_items(&items, " + ", ""),
            id: order.order_number,
            date: order.created_at.format("%Y-%m-%d").to_string(),
            status: order.status,
            amount: format!("${:.2}", order.total_amount),
            download_link,
            items: items
                .into_iter()
                .map(|item| OrderLineView {
                    id: item.id.into_inner(),
                    product_name: item.product_name,
                    quantity: item.quantity,
                    price: item.price,
                    download_url: item.download_url,
                })
                .collect(),
        }
    }
}

/// `"<first>"`, or `"<first><joiner>N more"` for several lines.
fn describe_items(items: &[OrderItem], joiner: &str, empty: &str) -> String {
    match items {
        [] => empty.to_owned(),
        [only] => only.product_name.clone(),
        [first, rest @ ..] => format!("{}{joiner}{} more", first.product_name, rest.len()),
    }
}

/// The user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(&user.id, None)
        .await?;
    Ok(Json(orders.into_iter().map(OrderSummary::from).collect()))
}

// =============================================================================
// Stats
// =============================================================================

/// Percentage change shown next to a stat.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    /// `"+12%"` or `"-40%"`.
    pub value: String,
    pub is_positive: bool,
}

impl Trend {
    /// Rounded change from `previous` to `current`; `+100%` when there is
    /// nothing to compare against but something now.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn between(current: f64, previous: f64) -> Self {
        let percent = if previous > 0.0 {
            ((current - previous) / previous * 100.0).round() as i64
        } else if current > 0.0 {
            100
        } else {
            0
        };
        let sign = if percent >= 0 { "+" } else { "" };
        Self {
            value: format!("{sign}{percent}%"),
            is_positive: percent >= 0,
        }
    }
}

/// One dashboard stat.
#[derive(Debug, Serialize)]
pub struct Stat {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    pub subtitle: &'static str,
}

/// Dashboard stats.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_orders: Stat,
    pub total_spent: Stat,
    pub wishlist_items: Stat,
}

/// Midnight UTC on the first of `month`.
fn month_start(year: i32, month: u32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| AppError::Internal(format!("invalid month {year}-{month}")))
}

/// Order count and spending, with month-over-month and year-over-year trends.
#[instrument(skip(state, user), fields(user_id = %user.id))]
#[allow(clippy::cast_precision_loss)]
pub async fn stats(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
) -> Result<Json<UserStats>> {
    let now = Utc::now();
    let this_month = month_start(now.year(), now.month())?;
    let last_month = if now.month() == 1 {
        month_start(now.year() - 1, 12)?
    } else {
        month_start(now.year(), now.month() - 1)?
    };
    let this_year = month_start(now.year(), 1)?;
    let last_year = month_start(now.year() - 1, 1)?;

    let orders = OrderRepository::new(state.pool());
    let total_orders = orders.count_for_user(&user.id, None, None).await?;
    let orders_this_month = orders
        .count_for_user(&user.id, Some(this_month), None)
        .await?;
    let orders_last_month = orders
        .count_for_user(&user.id, Some(last_month), Some(this_month))
        .await?;
    let spent_this_year = orders.spent_by_user(&user.id, this_year, None).await?;
    let spent_last_year = orders
        .spent_by_user(&user.id, last_year, Some(this_year))
        .await?;
    let wishlist_count = WishlistRepository::new(state.pool())
        .count(&user.id)
        .await?;

    Ok(Json(UserStats {
        total_orders: Stat {
            value: total_orders.to_string(),
            trend: Some(Trend::between(
                orders_this_month as f64,
                orders_last_month as f64,
            )),
            subtitle: "Since last month",
        },
        total_spent: Stat {
            value: format!("${spent_this_year:.0}"),
            trend: Some(Trend::between(spent_this_year, spent_last_year)),
            subtitle: "This year",
        },
        wishlist_items: Stat {
            value: wishlist_count.to_string(),
            trend: None,
            subtitle: "Saved products",
        },
    }))
}

// =============================================================================
// Activity
// =============================================================================

/// One entry of the activity feed.
#[derive(Debug, Serialize)]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    pub icon: &'static str,
}

impl From<&OrderWithItems> for ActivityEntry {
    fn from(OrderWithItems { order, items }: &OrderWithItems) -> Self {
        Self {
            id: format!("order-{}", order.id),
            kind: "order",
            title: format!(
                "Order #{} {}",
                order.order_number,
                order.status.as_str().to_lowercase()
            ),
            description: describe_items(items, " and ", "Multiple items"),
            date: order.created_at,
            status: Some(order.status),
            icon: "order",
        }
    }
}

impl From<&WishlistItem> for ActivityEntry {
    fn from(item: &WishlistItem) -> Self {
        Self {
            id: format!("wishlist-{}", item.id),
            kind: "wishlist",
            title: "Added item to wishlist".to_owned(),
            description: item.name.clone(),
            date: item.created_at,
            status: None,
            icon: "wishlist",
        }
    }
}

/// The latest orders and wishlist additions, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn activity(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
) -> Result<Json<Vec<ActivityEntry>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(&user.id, Some(ACTIVITY_ORDERS))
        .await?;
    let saved = WishlistRepository::new(state.pool())
        .list(&user.id, Some(ACTIVITY_WISHLIST))
        .await?;

    let mut entries: Vec<ActivityEntry> = orders
        .iter()
        .map(ActivityEntry::from)
        .chain(saved.iter().map(ActivityEntry::from))
        .collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.truncate(ACTIVITY_LEN);

    Ok(Json(entries))
}

// =============================================================================
// Profile
// =============================================================================

/// `PATCH /api/user/profile` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub language: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// The account as stored.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(&user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;
    Ok(Json(user))
}

/// Change name, email, language and optionally the password.
#[instrument(skip(state, session, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireSession(user): RequireSession,
    payload: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload?;
    let (Some(name), Some(email)) = (
        body.name.as_deref().map(str::trim).filter(|n| !n.is_empty()),
        body.email.as_deref().map(str::trim).filter(|e| !e.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Name and email are required".to_owned(),
        ));
    };

    let change = ProfileChange {
        name,
        email,
        language: body.language.as_deref(),
        current_password: body.current_password.as_deref(),
        new_password: body.new_password.as_deref(),
    };
    let updated = AuthService::new(state.pool())
        .update_profile(&user.id, &change)
        .await?;

    // Keep the session identity in step with the new name and email.
    let refreshed = CurrentUser {
        role: user.role,
        ..CurrentUser::from(&updated)
    };
    set_current_user(&session, &refreshed)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": updated,
    })))
}
