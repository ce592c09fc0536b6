//! The two session exchanges run during a refresh cycle.
//!
//! `POST {refresh_path}` trades a refresh token for a new [`TokenPair`];
//! `POST {login_path}` trades username/password for one. Both accept either
//! a bare pair or Halo's `{ status, message, data }` envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::TokenPair;
use crate::store::{Secret, StoreError};
use crate::transport::{HttpRequest, Transport, TransportError};

/// Why a refresh or login exchange did not produce tokens.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no login credentials configured")]
    MissingLogin,

    #[error("{endpoint} rejected with status {status}: {message}")]
    Rejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("malformed token response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Paths of the session endpoints, relative to the transport base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEndpoints {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_refresh_path() -> String {
    "/refresh".to_string()
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            refresh_path: default_refresh_path(),
        }
    }
}

/// Username and password used when the refresh token is missing or rejected.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: Secret,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password),
        }
    }
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenPayload {
    Enveloped { data: TokenPair },
    Bare(TokenPair),
}

impl From<TokenPayload> for TokenPair {
    fn from(payload: TokenPayload) -> Self {
        match payload {
            TokenPayload::Enveloped { data } => data,
            TokenPayload::Bare(pair) => pair,
        }
    }
}

/// Exchange `refresh_token` for a new pair.
pub async fn refresh<T: Transport + ?Sized>(
    transport: &T,
    endpoints: &AuthEndpoints,
    refresh_token: &Secret,
) -> Result<TokenPair, SessionError> {
    let request = HttpRequest::post(&endpoints.refresh_path).json(&RefreshBody {
        refresh_token: refresh_token.expose(),
    })?;
    exchange(transport, &endpoints.refresh_path, request).await
}

/// Log in with username and password.
pub async fn login<T: Transport + ?Sized>(
    transport: &T,
    endpoints: &AuthEndpoints,
    credentials: &LoginCredentials,
) -> Result<TokenPair, SessionError> {
    let request = HttpRequest::post(&endpoints.login_path).json(&LoginBody {
        username: &credentials.username,
        password: credentials.password.expose(),
    })?;
    exchange(transport, &endpoints.login_path, request).await
}

async fn exchange<T: Transport + ?Sized>(
    transport: &T,
    endpoint: &str,
    request: HttpRequest,
) -> Result<TokenPair, SessionError> {
    let response = transport.send(request).await?;
    if !response.is_success() {
        return Err(SessionError::Rejected {
            endpoint: endpoint.to_string(),
            status: response.status.as_u16(),
            message: response
                .server_message()
                .unwrap_or_else(|| "no message".to_string()),
        });
    }
    let payload: TokenPayload = response.json()?;
    Ok(payload.into())
}
