//! Server cart mirror.
//!
//! The client owns the cart; the server keeps a copy per signed-in user so
//! the cart follows them across devices. Every sync replaces the whole copy,
//! so the last sync to arrive wins.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use autocatalog_core::{LineItem, SyncItem};

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalSession, RequireSession};
use crate::state::AppState;

/// `POST /api/cart/sync` body.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub items: Vec<SyncItem>,
}

/// The signed-in user's server cart; `[]` for anonymous visitors.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalSession(user): OptionalSession,
) -> Result<Json<Vec<LineItem>>> {
    let Some(user) = user else {
        return Ok(Json(Vec::new()));
    };
    let items = CartRepository::new(state.pool()).items(&user.id).await?;
    Ok(Json(items))
}

/// Replace the server cart with the client's items.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn sync(
    State(state): State<AppState>,
    RequireSession(user): RequireSession,
    payload: std::result::Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = payload?;

    if body.items.iter().any(|item| item.quantity < 1) {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_owned(),
        ));
    }
    if body
        .items
        .iter()
        .any(|item| u32::try_from(item.quantity).is_err())
    {
        return Err(AppError::BadRequest("Quantity is too large".to_owned()));
    }

    CartRepository::new(state.pool())
        .replace(&user.id, &body.items)
        .await?;

    tracing::debug!(lines = body.items.len(), "Cart replaced");
    Ok(Json(json!({ "success": true })))
}
