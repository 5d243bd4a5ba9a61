//! HTTP client for the wellness API with a key-addressed query cache.
//!
//! [`ApiClient`] maps one method to one route and unwraps the response
//! envelope. [`QueryClient`] caches results per [`QueryKey`] and
//! [`Queries`] binds the two with a policy per resource.

pub mod hooks;
pub mod query;
pub mod service;

pub use hooks::*;
pub use query::*;
pub use service::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response envelope carried no data")]
    MissingData,
}

impl ClientError {
    /// Transport failures and server-side errors are worth retrying;
    /// client errors such as 401 or 404 will not change on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ClientError::Api { status, .. } => *status >= 500,
            ClientError::MissingData => false,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Api { status, .. } => Some(*status),
            ClientError::MissingData => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
