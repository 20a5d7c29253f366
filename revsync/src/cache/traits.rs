//! Cache storage trait definitions.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Trait for cache storage backends.
#[async_trait]
pub trait CacheStorage: Send + Sync + std::fmt::Debug {
    /// Get a value by key.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Set a value, replacing any previous one.
    async fn set(&self, key: &str, value: &[u8]);

    /// Remove a value by key.
    async fn remove(&self, key: &str);

    /// Check whether a value exists for the key.
    async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }
}

/// Extension trait for cache storage with typed operations.
#[async_trait]
pub trait CacheStorageExt: CacheStorage {
    /// Get a JSON-deserialized value. Undecodable entries read as absent.
    async fn get_json<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let data = self.get(key).await?;
        match serde_json::from_slice(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Dropping undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Set a JSON-serialized value.
    async fn set_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let data = serde_json::to_vec(value).map_err(|e| Error::Cache(e.to_string()))?;
        self.set(key, &data).await;
        Ok(())
    }
}

// Blanket implementation
impl<T: CacheStorage + ?Sized> CacheStorageExt for T {}
