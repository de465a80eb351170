//! Authentication route handlers.
//!
//! Email/password accounts with Argon2 hashes. A successful sign-in stores a
//! [`CurrentUser`] in the session; its role is what every gate checks until
//! the user signs in again.

use autocatalog_core::{Role, RoleSet};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{
    GateDecision, OptionalSession, authorize, clear_current_user, set_current_user,
};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::state::AppState;

/// Registration body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

/// Sign-in body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create a `USER` account.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = payload?;
    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let user = AuthService::new(state.pool())
        .register(name, &body.email, &body.password, Role::User)
        .await?;

    tracing::info!(user_id = %user.id, "Account registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in and attach the user to the session.
#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<CurrentUser>> {
    let Json(body) = payload?;

    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Sign-in failed"))?;

    let current = CurrentUser::from(&user);
    set_current_user(&session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    set_sentry_user(&current.id, Some(current.email.as_str()));
    add_breadcrumb("auth", "Signed in", Some(&[("role", current.role.as_str())]));

    Ok(Json(current))
}

/// Sign out.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session write failed: {e}")))?;

    clear_sentry_user();
    add_breadcrumb("auth", "Signed out", None);

    Ok(Json(json!({ "success": true })))
}

/// The current session user, or `null`.
pub async fn session(OptionalSession(user): OptionalSession) -> Json<Option<CurrentUser>> {
    Json(user)
}

/// Where a "my account" link should send the visitor.
pub async fn admin_redirect(OptionalSession(user): OptionalSession) -> impl IntoResponse {
    let redirect = match authorize(user.as_ref(), RoleSet::ADMIN) {
        GateDecision::Unauthenticated => "/auth/signin",
        GateDecision::Allow => "/admin",
        GateDecision::Forbidden => "/dashboard",
    };
    Json(json!({ "redirect": redirect }))
}
