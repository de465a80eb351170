//! Server-rendered pages: sign-in, forbidden, and the gated admin panel.
//!
//! The `/admin` pages sit behind [`admin_page_gate`], so their handlers
//! only run for ADMIN and SUPER_ADMIN sessions.
//!
//! [`admin_page_gate`]: crate::middleware::admin_page_gate

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use autocatalog_core::{PageRequest, Role};

use crate::db::{CategoryRepository, OrderRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::{OptionalSession, set_current_user};
use crate::models::CurrentUser;
use crate::models::category::CategoryQuery;
use crate::models::user::User;
use crate::services::AuthService;
use crate::state::AppState;

/// `?callbackUrl=&error=` of the sign-in page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninQuery {
    pub callback_url: Option<String>,
    pub error: Option<String>,
}

/// Sign-in form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninForm {
    pub email: String,
    pub password: String,
    pub callback_url: Option<String>,
}

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "signin.html")]
pub struct SigninTemplate {
    pub callback_url: String,
    pub error: Option<String>,
}

/// Forbidden page template.
#[derive(Template, WebTemplate)]
#[template(path = "forbidden.html")]
pub struct ForbiddenTemplate {
    pub user: Option<CurrentUser>,
}

/// Admin overview template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/index.html")]
pub struct AdminIndexTemplate {
    pub user: CurrentUser,
    pub is_super_admin: bool,
    pub product_count: u64,
    pub category_count: usize,
    pub user_count: u64,
    pub order_count: u64,
}

/// Super admin template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/super.html")]
pub struct AdminSuperTemplate {
    pub user: CurrentUser,
    pub users: Vec<User>,
}

/// Keep callbacks on this site: a single leading slash only.
fn safe_callback(callback: Option<&str>) -> String {
    callback
        .filter(|url| url.starts_with('/') && !url.starts_with("//") && !url.contains('\\'))
        .unwrap_or("/")
        .to_owned()
}

/// Display the sign-in page.
pub async fn signin(Query(query): Query<SigninQuery>) -> impl IntoResponse {
    SigninTemplate {
        callback_url: safe_callback(query.callback_url.as_deref()),
        error: query.error,
    }
}

/// Handle sign-in form submission, then follow the callback.
#[instrument(skip(state, session, form))]
pub async fn signin_submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SigninForm>,
) -> Response {
    let callback = safe_callback(form.callback_url.as_deref());
    let retry = |error: &str| {
        Redirect::to(&format!(
            "/auth/signin?error={error}&callbackUrl={}",
            urlencoding::encode(&callback)
        ))
        .into_response()
    };

    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Sign-in failed");
            return retry("credentials");
        }
    };

    let current = CurrentUser::from(&user);
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "Failed to set session");
        return retry("session");
    }
    set_sentry_user(&current.id, Some(current.email.as_str()));

    Redirect::to(&callback).into_response()
}

/// Display the forbidden page.
pub async fn forbidden(OptionalSession(user): OptionalSession) -> impl IntoResponse {
    (StatusCode::FORBIDDEN, ForbiddenTemplate { user })
}

/// Session user of a gated page.
fn gated_user(user: Option<CurrentUser>) -> Result<CurrentUser> {
    user.ok_or(AppError::Unauthenticated)
}

/// Admin overview with catalog and account totals.
#[instrument(skip(state, user))]
pub async fn admin_index(
    State(state): State<AppState>,
    OptionalSession(user): OptionalSession,
) -> Result<impl IntoResponse> {
    let user = gated_user(user)?;
    let pool = state.pool();

    let product_count = ProductRepository::new(pool).count().await?;
    let category_count = CategoryRepository::new(pool)
        .list(&CategoryQuery::default())
        .await?
        .len();
    let user_count = UserRepository::new(pool).count().await?;
    let (_, order_count) = OrderRepository::new(pool)
        .list(None, PageRequest::new(None, Some(1), 1))
        .await?;

    Ok(AdminIndexTemplate {
        is_super_admin: user.role == Role::SuperAdmin,
        user,
        product_count,
        category_count,
        user_count,
        order_count,
    })
}

/// Account and role overview for super admins.
#[instrument(skip(state, user))]
pub async fn admin_super(
    State(state): State<AppState>,
    OptionalSession(user): OptionalSession,
) -> Result<impl IntoResponse> {
    let user = gated_user(user)?;
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(AdminSuperTemplate { user, users })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_callback() {
        assert_eq!(safe_callback(Some("/admin/products")), "/admin/products");
        assert_eq!(safe_callback(Some("https://evil.example")), "/");
        assert_eq!(safe_callback(Some("//evil.example")), "/");
        assert_eq!(safe_callback(Some("/\\evil.example")), "/");
        assert_eq!(safe_callback(None), "/");
    }
}
