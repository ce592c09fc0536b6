//! In-memory credential storage.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{Secret, SecretStore, StoreError};

/// In-memory credential store.
///
/// Used by tests and by `haloctl --ephemeral`. Data is lost when the process
/// exits. Safe to share across tasks; locks are never held across an await.
pub struct MemoryStore {
    data: RwLock<HashMap<String, Secret>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys_count", &self.data.read().len())
            .finish()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.data.write().insert(key.to_string(), secret.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.write().remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let keys = self
            .data
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get() {
        let store = MemoryStore::new();

        store.set("token", &Secret::new("access-1")).await.unwrap();
        let retrieved = store.get("token").await.unwrap();

        assert_eq!(retrieved.unwrap().expose(), "access-1");
    }

    #[tokio::test]
    async fn test_memory_store_overwrite() {
        let store = MemoryStore::new();

        store.set("token", &Secret::new("old")).await.unwrap();
        store.set("token", &Secret::new("new")).await.unwrap();

        assert_eq!(store.get("token").await.unwrap().unwrap().expose(), "new");
    }

    #[tokio::test]
    async fn test_memory_store_get_nonexistent() {
        let store = MemoryStore::new();
        assert!(store.get("refresh_token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_delete() {
        let store = MemoryStore::new();

        store.set("token", &Secret::new("access-1")).await.unwrap();
        store.delete("token").await.unwrap();
        store.delete("token").await.unwrap();

        assert!(store.get("token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_list_keys() {
        let store = MemoryStore::new();
        store.set("token", &Secret::new("a")).await.unwrap();
        store.set("refresh_token", &Secret::new("r")).await.unwrap();

        assert_eq!(store.list_keys("").await.unwrap().len(), 2);
        assert_eq!(store.list_keys("refresh").await.unwrap(), vec!["refresh_token"]);
    }
}
