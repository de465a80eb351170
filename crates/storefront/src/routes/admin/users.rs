//! Account and role management.
//!
//! Admins may move accounts between USER and ADMIN. Granting or revoking
//! SUPER_ADMIN, and deleting accounts, is reserved to super admins.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use autocatalog_core::{Role, RoleSet, UserId};

use super::write_error;
use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireSuperAdmin, authorize};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::state::AppState;

/// `PATCH /api/admin/users` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeRequest {
    pub user_id: Option<String>,
    pub role: Option<String>,
}

/// Whether `actor` may move an account from `from` to `to`.
fn may_change_role(actor: &CurrentUser, from: Role, to: Role) -> Result<()> {
    if from == Role::SuperAdmin || to == Role::SuperAdmin {
        authorize(Some(actor), RoleSet::SUPER_ADMIN).into_result()?;
    }
    Ok(())
}

/// All accounts, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Change an account's role.
#[instrument(skip(state, admin, payload), fields(admin_id = %admin.user.id))]
pub async fn update_role(
    admin: RequireAdmin,
    State(state): State<AppState>,
    payload: std::result::Result<Json<RoleChangeRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(body) = payload?;
    let (Some(user_id), Some(role)) = (
        body.user_id.filter(|id| !id.is_empty()),
        body.role.filter(|r| !r.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "User ID and role are required".to_owned(),
        ));
    };
    let role: Role = role
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid role".to_owned()))?;

    let users = UserRepository::new(state.pool());
    let user_id = UserId::new(user_id);
    let target = users
        .get_by_id(&user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    may_change_role(&admin.user, target.role, role)?;

    let updated = users
        .update_role(&user_id, role)
        .await
        .map_err(write_error("User"))?;

    tracing::info!(user_id = %updated.id, from = %target.role, to = %role, "Role changed");
    Ok(Json(updated))
}

/// Delete an account. Super admins cannot delete themselves.
#[instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
pub async fn destroy(
    admin: RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id = UserId::new(id);
    if id == admin.user.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_owned(),
        ));
    }

    UserRepository::new(state.pool())
        .delete(&id)
        .await
        .map_err(write_error("User"))?;

    tracing::info!(user_id = %id, "Account deleted");
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use autocatalog_core::Email;

    use super::*;

    fn actor(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new("actor"),
            email: Email::parse("actor@example.com").unwrap(),
            name: None,
            role,
        }
    }

    #[test]
    fn test_admin_cannot_touch_super_admin_role() {
        let admin = actor(Role::Admin);
        assert!(may_change_role(&admin, Role::User, Role::Admin).is_ok());
        assert!(matches!(
            may_change_role(&admin, Role::User, Role::SuperAdmin),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            may_change_role(&admin, Role::SuperAdmin, Role::Admin),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_super_admin_may_grant_and_revoke() {
        let root = actor(Role::SuperAdmin);
        assert!(may_change_role(&root, Role::User, Role::SuperAdmin).is_ok());
        assert!(may_change_role(&root, Role::SuperAdmin, Role::User).is_ok());
    }
}
