//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Database readiness check
//!
//! # Auth
//! POST /api/auth/register           - Create a USER account
//! POST /api/auth/login              - Sign in, store the session user
//! POST /api/auth/logout             - Clear the session user
//! GET  /api/auth/session            - Current session user or null
//! GET  /api/auth/admin-redirect     - Where "my account" should go
//!
//! # Catalog (public, active products only)
//! GET  /api/categories              - Category tree with counts
//! GET  /api/products                - Paginated, filtered product list
//! GET  /api/products/latest         - Newest arrivals
//! GET  /api/products/{id}           - Product detail
//!
//! # Cart mirror
//! GET  /api/cart                    - Server cart ([] when anonymous)
//! POST /api/cart/sync               - Replace the server cart
//!
//! # Account (requires a session)
//! GET/POST/DELETE /api/user/wishlist
//! GET  /api/user/orders
//! GET  /api/user/stats
//! GET  /api/user/activity
//! GET/PATCH /api/user/profile
//!
//! # Checkout
//! POST /api/checkout
//!
//! # Admin API (ADMIN or SUPER_ADMIN)
//! GET/POST        /api/admin/categories
//! GET/PUT/DELETE  /api/admin/categories/{id}
//! GET/POST        /api/admin/products
//! GET/PUT/DELETE  /api/admin/products/{id}
//! GET/PATCH       /api/admin/users
//! DELETE          /api/admin/users/{id}   - SUPER_ADMIN only
//! GET             /api/admin/orders
//! PATCH           /api/admin/orders/{id}
//!
//! # Pages
//! GET  /auth/signin                 - Sign-in page
//! POST /auth/signin                 - Sign-in form, then follow callbackUrl
//! GET  /403                         - Forbidden page
//! GET  /admin                       - Admin panel (page gate)
//! GET  /admin/super                 - Super admin panel (page gate)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod pages;
pub mod products;
pub mod user;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};

use crate::middleware::admin_page_gate;
use crate::state::AppState;

/// Create the auth API router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .route("/admin-redirect", get(auth::admin_redirect))
}

/// Create the public product router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/latest", get(products::latest))
        .route("/{id}", get(products::show))
}

/// Create the cart mirror router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/sync", post(cart::sync))
}

/// Create the account router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wishlist",
            get(user::wishlist)
                .post(user::add_to_wishlist)
                .delete(user::remove_from_wishlist),
        )
        .route("/orders", get(user::orders))
        .route("/stats", get(user::stats))
        .route("/activity", get(user::activity))
        .route("/profile", get(user::profile).patch(user::update_profile))
}

/// Create the gated admin page router.
pub fn admin_page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::admin_index))
        .route("/super", get(pages::admin_super))
        .layer(from_fn(admin_page_gate))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/auth", auth_routes())
        .route("/api/categories", get(categories::index))
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/user", user_routes())
        .route("/api/checkout", post(checkout::checkout))
        .nest("/api/admin", admin::routes())
        .route("/auth/signin", get(pages::signin).post(pages::signin_submit))
        .route("/403", get(pages::forbidden))
        .nest("/admin", admin_page_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
