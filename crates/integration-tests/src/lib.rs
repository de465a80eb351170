//! End-to-end tests for the AutoCatalog storefront.
//!
//! Each [`TestApp`] serves the real router on `127.0.0.1:0` over a private
//! in-memory database, with in-memory sessions and an injectable payment
//! gateway. Nothing outside the process is needed:
//!
//! ```bash
//! cargo test -p autocatalog-integration-tests
//! ```
//!
//! # Test Files
//!
//! - `access_control` - 401/403 API gate and page-gate redirects
//! - `auth_flow` - Registration, sign-in, session and sign-out
//! - `catalog_admin` - Category and product management rules
//! - `cart_sync` - Server cart mirror replacement semantics
//! - `checkout` - Charging, declines and persisted orders

use std::sync::Arc;

use reqwest::{Client, Response, redirect::Policy};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use autocatalog_core::{CategoryId, Discount, ProductId, ProductType, Role};
use autocatalog_storefront::config::StorefrontConfig;
use autocatalog_storefront::db::{self, CategoryRepository, ProductRepository};
use autocatalog_storefront::models::category::NewCategory;
use autocatalog_storefront::models::product::{NewProduct, ProductDetails};
use autocatalog_storefront::models::user::User;
use autocatalog_storefront::services::{AuthService, PaymentGateway, SimulatedGateway};
use autocatalog_storefront::state::AppState;

/// Password given to every account created through [`TestApp::create_user`].
pub const PASSWORD: &str = "correct-horse-battery";

/// A running storefront plus a cookie-keeping client.
pub struct TestApp {
    /// `http://127.0.0.1:<port>`
    pub address: String,
    /// The server's database, for seeding and assertions.
    pub pool: SqlitePool,
    /// Keeps cookies, never follows redirects.
    pub client: Client,
}

impl TestApp {
    /// Serve the storefront with a gateway that approves every charge.
    pub async fn spawn() -> Self {
        Self::spawn_with_gateway(Arc::new(SimulatedGateway::new())).await
    }

    /// Serve the storefront charging through `payments`.
    pub async fn spawn_with_gateway(payments: Arc<dyn PaymentGateway>) -> Self {
        let pool = db::create_memory_pool()
            .await
            .expect("Failed to open in-memory database");
        db::migrate(&pool).await.expect("Failed to migrate");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("Listener has no address")
        );

        let config = StorefrontConfig::local("sqlite::memory:", &address);
        let state = AppState::with_gateway(config, pool.clone(), payments);
        let router = autocatalog_storefront::app(state, MemoryStore::default());

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("Test server failed");
        });

        Self {
            address,
            pool,
            client: new_client(),
        }
    }

    /// Absolute URL of `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    /// A second visitor with an empty cookie jar.
    #[must_use]
    pub fn other_client(&self) -> Client {
        new_client()
    }

    /// Insert an account directly, bypassing the role-less register API.
    pub async fn create_user(&self, email: &str, role: Role) -> User {
        AuthService::new(&self.pool)
            .register(Some("Test User"), email, PASSWORD, role)
            .await
            .expect("Failed to create user")
    }

    /// Sign `client` in through the API.
    pub async fn login_with(&self, client: &Client, email: &str, password: &str) -> Response {
        client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// Create an account with `role` and sign the shared client in as it.
    pub async fn login_as(&self, role: Role) -> User {
        let email = format!("{}@example.com", role.as_str().to_lowercase());
        let user = self.create_user(&email, role).await;
        let resp = self.login_with(&self.client, &email, PASSWORD).await;
        assert_eq!(resp.status(), 200, "login as {role} failed");
        user
    }

    /// Insert a top-level category.
    pub async fn category(&self, slug: &str) -> CategoryId {
        self.child_category(slug, None).await
    }

    /// Insert a category under `parent`.
    pub async fn child_category(&self, slug: &str, parent: Option<&CategoryId>) -> CategoryId {
        CategoryRepository::new(&self.pool)
            .create(&NewCategory {
                name: slug.to_uppercase(),
                slug: slug.to_owned(),
                description: None,
                image: None,
                parent_id: parent.cloned(),
            })
            .await
            .expect("Failed to create category")
            .id
    }

    /// Insert an active repair manual.
    pub async fn product(&self, slug: &str, category_id: &CategoryId, price: f64) -> ProductId {
        ProductRepository::new(&self.pool)
            .create(&NewProduct {
                name: format!("Manual {slug}"),
                slug: slug.to_owned(),
                description: None,
                price,
                discount: Discount::NONE,
                images: Vec::new(),
                details: ProductDetails::default(),
                product_type: ProductType::RepairManual,
                category_id: category_id.clone(),
                is_active: true,
                featured: false,
            })
            .await
            .expect("Failed to create product")
            .id
    }

    /// `GET path` with the shared client.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// `POST path` with a JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// `PUT path` with a JSON body.
    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    /// `PATCH path` with a JSON body.
    pub async fn patch_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PATCH request failed")
    }

    /// `DELETE path`.
    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE request failed")
    }
}

fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Status and JSON body of `resp`.
pub async fn json_body(resp: Response) -> (u16, Value) {
    let status = resp.status().as_u16();
    let body = resp.json().await.expect("Response body is not JSON");
    (status, body)
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Response has no Location header")
        .to_owned()
}
