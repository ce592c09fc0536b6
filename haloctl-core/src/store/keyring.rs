//! OS keyring-backed credential storage.

use async_trait::async_trait;
use keyring::Entry;

use super::{Secret, SecretStore, StoreError};
use crate::credentials::CredentialKey;

/// OS keyring-backed credential store.
///
/// Uses the platform's native keyring service (Keychain, Secret Service,
/// Credential Manager). Each key becomes one entry whose service is the
/// configured service name and whose user is the key. Keyring calls are
/// synchronous, so they run on the blocking pool.
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    /// Try to create a new keyring store.
    ///
    /// Returns an error if the keyring backend is not available on this platform.
    pub fn try_new(service_name: &str) -> Result<Self, StoreError> {
        match Entry::new(service_name, "availability_check") {
            Ok(_) => Ok(Self {
                service_name: service_name.to_string(),
            }),
            Err(e) => Err(StoreError::KeyringUnavailable {
                message: format!("keyring backend not available: {}", e),
            }),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service_name, key).map_err(|e| StoreError::BackendError {
            message: format!("failed to create keyring entry: {}", e),
        })
    }

    async fn blocking<T, F>(&self, key: &str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(Entry) -> Result<T, StoreError> + Send + 'static,
    {
        let entry = self.entry(key)?;
        tokio::task::spawn_blocking(move || op(entry))
            .await
            .map_err(|e| StoreError::BackendError {
                message: format!("keyring task failed: {}", e),
            })?
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service_name", &self.service_name)
            .finish()
    }
}

fn map_keyring_error(key: &str, e: keyring::Error) -> StoreError {
    match e {
        keyring::Error::NoStorageAccess(_) => StoreError::AccessDenied {
            key: key.to_string(),
        },
        keyring::Error::Ambiguous(_) => StoreError::BackendError {
            message: format!("ambiguous keyring entry for key: {}", key),
        },
        keyring::Error::PlatformFailure(e) => StoreError::BackendError {
            message: format!("platform keyring failure: {}", e),
        },
        e => StoreError::BackendError {
            message: format!("keyring error: {}", e),
        },
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let owned = key.to_string();
        self.blocking(key, move |entry| match entry.get_password() {
            Ok(password) => Ok(Some(Secret::new(password))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(&owned, e)),
        })
        .await
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let owned = key.to_string();
        let secret = secret.clone();
        self.blocking(key, move |entry| {
            entry
                .set_password(secret.expose())
                .map_err(|e| map_keyring_error(&owned, e))
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let owned = key.to_string();
        self.blocking(key, move |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(&owned, e)),
        })
        .await
    }

    /// Platform keyrings cannot enumerate entries, so this probes the fixed
    /// set of credential keys haloctl writes.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for key in CredentialKey::ALL {
            let name = key.as_str();
            if name.starts_with(prefix) && self.exists(name).await? {
                keys.push(name.to_string());
            }
        }
        Ok(keys)
    }
}
