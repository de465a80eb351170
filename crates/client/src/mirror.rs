//! Server cart mirror.
//!
//! The server stores one cart per user and replaces it wholesale on every
//! sync. There is no diffing and no version check, so whichever push lands
//! last defines the server cart.

use async_trait::async_trait;
use autocatalog_core::{LineItem, SyncItem};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Remote copy of the cart.
#[async_trait]
pub trait CartMirror: Send + Sync {
    /// Replace the remote cart with `items`.
    async fn push(&self, items: Vec<LineItem>) -> ClientResult<()>;

    /// Fetch the remote cart.
    async fn fetch(&self) -> ClientResult<Vec<LineItem>>;
}

#[derive(Serialize)]
struct SyncRequest {
    items: Vec<SyncItem>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `CartMirror` over the storefront's `/api/cart` endpoints.
///
/// The underlying client keeps a cookie jar, so after [`login`](Self::login)
/// every request carries the session cookie.
#[derive(Debug, Clone)]
pub struct HttpCartMirror {
    client: Client,
    config: ClientConfig,
}

impl HttpCartMirror {
    /// Build a mirror for the storefront at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Sign in, storing the session cookie for later pushes.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` on bad credentials, or a transport
    /// error.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<()> {
        let response = self
            .client
            .post(self.config.url("/api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        check(response).await.map(drop)
    }
}

#[async_trait]
impl CartMirror for HttpCartMirror {
    async fn push(&self, items: Vec<LineItem>) -> ClientResult<()> {
        let body = SyncRequest {
            items: items.iter().map(SyncItem::from).collect(),
        };

        let response = self
            .client
            .post(self.config.url("/api/cart/sync"))
            .json(&body)
            .send()
            .await?;

        check(response).await.map(drop)
    }

    async fn fetch(&self) -> ClientResult<Vec<LineItem>> {
        let response = self
            .client
            .get(self.config.url("/api/cart"))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}

async fn check(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_owned(),
    };

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
