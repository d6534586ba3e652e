//! Cache registry.

use super::backend::{CacheEntry, CacheStore};
use super::key::RequestKey;
use super::partition::PartitionName;
use crate::types::{Request, Response};
use crate::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub skipped_puts: u64,
    pub deleted_partitions: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    skipped_puts: AtomicU64,
    deleted_partitions: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            skipped_puts: self.skipped_puts.load(Ordering::Relaxed),
            deleted_partitions: self.deleted_partitions.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Sole owner of cache storage. Executors write through [`CacheRegistry::put`]; partitions
/// are removed only by [`CacheRegistry::delete_all_except`] (activation) and
/// [`CacheRegistry::delete_all`] (control channel).
#[derive(Clone)]
pub struct CacheRegistry {
    store: Arc<dyn CacheStore>,
    stats: Arc<AtomicStats>,
}

impl CacheRegistry {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    pub async fn open(&self, partition: &PartitionName) -> Result<()> {
        self.track(self.store.open(&partition.to_string()).await)
    }

    pub async fn match_request(
        &self,
        partition: &PartitionName,
        request: &Request,
    ) -> Result<Option<CacheEntry>> {
        let key = RequestKey::from_request(request);
        let found = self.track(self.store.get(&partition.to_string(), &key).await)?;
        if found.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    /// First entry found across `partitions`, in the given order.
    pub async fn match_any(
        &self,
        partitions: &[&PartitionName],
        request: &Request,
    ) -> Result<Option<(PartitionName, CacheEntry)>> {
        for partition in partitions {
            if let Some(entry) = self.match_request(partition, request).await? {
                return Ok(Some(((*partition).clone(), entry)));
            }
        }
        Ok(None)
    }

    /// Store `response` under the request's key. Non-2xx responses are never persisted;
    /// the return value says whether the entry was written.
    pub async fn put(
        &self,
        partition: &PartitionName,
        request: &Request,
        response: &Response,
    ) -> Result<bool> {
        if !response.is_success() {
            self.stats.skipped_puts.fetch_add(1, Ordering::Relaxed);
            debug!(
                partition = %partition,
                url = %request.url(),
                status = response.status,
                "not caching non-success response"
            );
            return Ok(false);
        }
        let entry = CacheEntry::new(RequestKey::from_request(request), response.clone());
        self.track(self.store.put(&partition.to_string(), entry).await)?;
        self.stats.puts.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Delete every partition whose name is not in `keep`. Returns the deleted names.
    pub async fn delete_all_except(&self, keep: &[String]) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.list_names().await? {
            if keep.contains(&name) {
                continue;
            }
            if self.track(self.store.delete_partition(&name).await)? {
                self.stats.deleted_partitions.fetch_add(1, Ordering::Relaxed);
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Delete every partition unconditionally.
    pub async fn delete_all(&self) -> Result<Vec<String>> {
        self.delete_all_except(&[]).await
    }

    pub async fn list_names(&self) -> Result<Vec<String>> {
        self.track(self.store.partitions().await)
    }

    /// Byte length of all stored response bodies across all partitions.
    pub async fn total_size(&self) -> Result<u64> {
        let mut total = 0;
        for name in self.list_names().await? {
            total += self.track(self.store.partition_size(&name).await)?;
        }
        Ok(total)
    }

    pub async fn entry_count(&self, partition: &str) -> Result<usize> {
        self.track(self.store.entry_count(partition).await)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    fn track<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
        }
        result
    }
}
