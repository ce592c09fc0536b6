//! Error types surfaced to callers of the interceptor and API client.

use thiserror::Error;

use crate::store::StoreError;
use crate::transport::TransportError;

/// Categorized failure of one API call.
///
/// Only an expired-token 401 is recovered inside the interceptor; every
/// other class ends up here.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the exchange.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// 400-class rejection caused by the request itself.
    #[error("{message}")]
    Request { message: String },

    /// 401 that could not be resolved by refresh or login.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// Any other non-2xx status.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The credential store failed while reading or writing tokens.
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// A 2xx body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub(crate) fn auth(message: impl Into<String>) -> Self {
        ApiError::Auth {
            message: message.into(),
        }
    }

    pub(crate) fn request(message: impl Into<String>) -> Self {
        ApiError::Request {
            message: message.into(),
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { .. } => Some(400),
            ApiError::Auth { .. } => Some(401),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
