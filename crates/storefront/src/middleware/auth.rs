//! Access control gate, session extractors, and the admin page gate.
//!
//! Every decision goes through [`authorize`]: the JSON API extractors turn
//! its verdict into 401/403 bodies, and [`admin_page_gate`] turns the same
//! verdict into redirects for the HTML admin pages.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, OriginalUri, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use autocatalog_core::RoleSet;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Outcome of comparing a session against a required role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Role is in the set.
    Allow,
    /// No session user.
    Unauthenticated,
    /// Session user whose role is not in the set.
    Forbidden,
}

/// Decide whether `session` may reach something that requires `required`.
#[must_use]
pub fn authorize(session: Option<&CurrentUser>, required: RoleSet) -> GateDecision {
    match session {
        None => GateDecision::Unauthenticated,
        Some(user) if required.contains(user.role) => GateDecision::Allow,
        Some(_) => GateDecision::Forbidden,
    }
}

impl GateDecision {
    /// The API rejection for this decision, `Ok` when allowed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthenticated` or `AppError::Forbidden`.
    pub const fn into_result(self) -> Result<(), AppError> {
        match self {
            Self::Allow => Ok(()),
            Self::Unauthenticated => Err(AppError::Unauthenticated),
            Self::Forbidden => Err(AppError::Forbidden),
        }
    }
}

/// A role set known at compile time, for [`RequireRole`].
pub trait RoleRequirement {
    const ROLES: RoleSet;
}

/// `{ADMIN, SUPER_ADMIN}`.
pub struct AdminOnly;

impl RoleRequirement for AdminOnly {
    const ROLES: RoleSet = RoleSet::ADMIN;
}

/// `{SUPER_ADMIN}`.
pub struct SuperAdminOnly;

impl RoleRequirement for SuperAdminOnly {
    const ROLES: RoleSet = RoleSet::SUPER_ADMIN;
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a signed-in user of any role.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(user): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireSession(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts).await;
        authorize(user.as_ref(), RoleSet::ANY).into_result()?;
        user.map(Self).ok_or(AppError::Unauthenticated)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireSession`, this never rejects.
pub struct OptionalSession(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Extractor that requires a signed-in user whose role is in `R::ROLES`.
///
/// Runs before the handler body, so a rejected request never touches storage.
pub struct RequireRole<R> {
    pub user: CurrentUser,
    _requirement: PhantomData<fn() -> R>,
}

/// Admin panel and `/api/admin/*`.
pub type RequireAdmin = RequireRole<AdminOnly>;
/// Super-admin-only operations.
pub type RequireSuperAdmin = RequireRole<SuperAdminOnly>;

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts).await;
        authorize(user.as_ref(), R::ROLES).into_result()?;
        user.map(|user| Self {
            user,
            _requirement: PhantomData,
        })
        .ok_or(AppError::Unauthenticated)
    }
}

/// Where an `/admin` page request must be sent instead, if anywhere.
///
/// `target` is the original path and query.
#[must_use]
pub fn admin_page_redirect(session: Option<&CurrentUser>, target: &str) -> Option<String> {
    match authorize(session, RoleSet::ADMIN) {
        GateDecision::Unauthenticated => Some(format!(
            "/auth/signin?callbackUrl={}",
            urlencoding::encode(target)
        )),
        GateDecision::Forbidden => Some("/403".to_owned()),
        GateDecision::Allow => {
            let path = target.split('?').next().unwrap_or(target);
            let super_only = path == "/admin/super" || path.starts_with("/admin/super/");
            (super_only && authorize(session, RoleSet::SUPER_ADMIN) != GateDecision::Allow)
                .then(|| "/admin".to_owned())
        }
    }
}

/// Page gate for the nested `/admin` router.
///
/// Unauthenticated visitors go to sign-in with a callback, under-privileged
/// users to `/403`, and admins without super-admin rights away from
/// `/admin/super`.
pub async fn admin_page_gate(request: Request, next: Next) -> Response {
    let target = request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().clone(), |uri| uri.0.clone());
    let target = target
        .path_and_query()
        .map_or_else(|| target.path().to_owned(), ToString::to_string);

    let session = request.extensions().get::<Session>().cloned();
    let user = match session {
        Some(session) => session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten(),
        None => None,
    };

    match admin_page_redirect(user.as_ref(), &target) {
        Some(location) => {
            tracing::debug!(%target, %location, "Admin page gate redirect");
            Redirect::to(&location).into_response()
        }
        None => next.run(request).await,
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
