//! Cache store backends.

use super::key::RequestKey;
use crate::types::Response;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

/// A stored request/response pairing. Entries are immutable; a later `put` for the same
/// key replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: RequestKey,
    pub response: Response,
    pub stored_at: SystemTime,
}

impl CacheEntry {
    pub fn new(key: RequestKey, response: Response) -> Self {
        Self {
            key,
            response,
            stored_at: SystemTime::now(),
        }
    }
}

/// Durable key/value contract the registry is built on.
///
/// Implementations must make `put` atomic per key: concurrent writes to different keys
/// never corrupt each other, concurrent writes to the same key resolve last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the partition if it does not exist. Idempotent.
    async fn open(&self, partition: &str) -> Result<()>;
    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>>;
    /// Store `entry`, creating the partition if needed.
    async fn put(&self, partition: &str, entry: CacheEntry) -> Result<()>;
    /// Returns `true` if the partition existed.
    async fn delete_partition(&self, partition: &str) -> Result<bool>;
    async fn partitions(&self) -> Result<Vec<String>>;
    /// Sum of body lengths stored in one partition (0 for an unknown partition).
    async fn partition_size(&self, partition: &str) -> Result<u64>;
    async fn entry_count(&self, partition: &str) -> Result<usize>;
    fn name(&self) -> &'static str;
}

type Partitions = BTreeMap<String, HashMap<RequestKey, CacheEntry>>;

/// In-process store. Contents live as long as the value.
#[derive(Clone, Default)]
pub struct MemoryStore {
    partitions: Arc<RwLock<Partitions>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Partitions>> {
        self.partitions.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Partitions>> {
        self.partitions.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> Error {
    Error::storage_with_context(
        "memory store lock poisoned",
        ErrorContext::new().with_source("memory_store"),
    )
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, partition: &str) -> Result<()> {
        self.write()?.entry(partition.to_string()).or_default();
        Ok(())
    }

    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>> {
        Ok(self
            .read()?
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, partition: &str, entry: CacheEntry) -> Result<()> {
        self.write()?
            .entry(partition.to_string())
            .or_default()
            .insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        Ok(self.write()?.remove(partition).is_some())
    }

    async fn partitions(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }

    async fn partition_size(&self, partition: &str) -> Result<u64> {
        Ok(self
            .read()?
            .get(partition)
            .map(|entries| entries.values().map(|e| e.response.body_len()).sum())
            .unwrap_or(0))
    }

    async fn entry_count(&self, partition: &str) -> Result<usize> {
        Ok(self.read()?.get(partition).map(|e| e.len()).unwrap_or(0))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::new("GET", &Url::parse(&format!("https://example.com{}", path)).unwrap())
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let store = MemoryStore::new();
        store.open("static-v1").await.unwrap();
        store.put("static-v1", CacheEntry::new(key("/a.js"), Response::ok("a"))).await.unwrap();
        store.open("static-v1").await.unwrap();
        assert_eq!(store.entry_count("static-v1").await.unwrap(), 1);
        assert_eq!(store.partitions().await.unwrap(), vec!["static-v1"]);
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = MemoryStore::new();
        store.put("dynamic-v1", CacheEntry::new(key("/x"), Response::ok("old"))).await.unwrap();
        store.put("dynamic-v1", CacheEntry::new(key("/x"), Response::ok("newer"))).await.unwrap();
        let entry = store.get("dynamic-v1", &key("/x")).await.unwrap().unwrap();
        assert_eq!(entry.response.text(), "newer");
        assert_eq!(store.partition_size("dynamic-v1").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_delete_partition_reports_existence() {
        let store = MemoryStore::new();
        store.open("generic-v1").await.unwrap();
        assert!(store.delete_partition("generic-v1").await.unwrap());
        assert!(!store.delete_partition("generic-v1").await.unwrap());
        assert_eq!(store.partition_size("generic-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_puts_to_different_keys() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put("static-v1", CacheEntry::new(key(&format!("/{}.css", i)), Response::ok("x")))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(store.entry_count("static-v1").await.unwrap(), 32);
    }
}
