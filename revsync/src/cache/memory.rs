//! In-memory cache implementation.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use super::traits::CacheStorage;

/// In-memory cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    // Every write is a single map operation, so a poisoned map is intact.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<u8>>> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<u8>>> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheStorage for MemoryCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.read().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &[u8]) {
        self.write().insert(key.to_owned(), value.to_vec());
    }

    async fn remove(&self, key: &str) {
        self.write().remove(key);
    }

    async fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }
}
