//! Stored access/refresh token pair.
//!
//! The interceptor reads [`Credentials`] from the store on every outbound
//! request and writes a fresh [`TokenPair`] after every successful refresh or
//! login. Nothing here caches tokens between requests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::{Secret, SecretStore, StoreError};

/// The keys haloctl writes into a [`SecretStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Short-lived access token attached to every request.
    AccessToken,

    /// Longer-lived token exchanged at `/refresh`.
    RefreshToken,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 2] = [CredentialKey::AccessToken, CredentialKey::RefreshToken];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whatever the store currently holds. Either half may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<Secret>,
    pub refresh_token: Option<Secret>,
}

impl Credentials {
    /// Read both tokens from the store.
    pub async fn load<S: SecretStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            access_token: store.get(CredentialKey::AccessToken.as_str()).await?,
            refresh_token: store.get(CredentialKey::RefreshToken.as_str()).await?,
        })
    }

    /// Remove both tokens from the store.
    pub async fn clear<S: SecretStore + ?Sized>(store: &S) -> Result<(), StoreError> {
        for key in CredentialKey::ALL {
            store.delete(key.as_str()).await?;
        }
        Ok(())
    }
}

/// Tokens issued by `/login` or `/refresh`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: Secret,
    pub refresh_token: Secret,

    /// Lifetime of the access token in seconds, when the server reports it.
    #[serde(default, alias = "expired_in", skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Secret::new(access_token),
            refresh_token: Secret::new(refresh_token),
            expires_in: None,
        }
    }

    /// Overwrite both stored tokens with this pair.
    pub async fn store<S: SecretStore + ?Sized>(&self, store: &S) -> Result<(), StoreError> {
        store
            .set(CredentialKey::AccessToken.as_str(), &self.access_token)
            .await?;
        store
            .set(CredentialKey::RefreshToken.as_str(), &self.refresh_token)
            .await
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}
