//! Client error types.

use thiserror::Error;

/// Errors from storage and server cart mirroring.
///
/// Store mutations never return these; they only surface from explicit
/// calls such as [`crate::CartStore::load_from_server`] or
/// [`crate::HttpCartMirror::login`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server has no session for this client.
    #[error("authentication required")]
    Unauthorized,

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// `error` field of the response body, if any.
        message: String,
    },

    /// Storage slot could not be read or written.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
