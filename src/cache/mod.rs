//! 缓存分区模块：按版本命名的分区与可插拔的存储后端（内存/磁盘）。
//!
//! # Cache Registry Module
//!
//! Named, versioned cache partitions over a pluggable durable store.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheRegistry`] | Owns all partitions: open, match, put, garbage collection, sizing |
//! | [`CacheStore`] | Trait for storage backends (atomic per-key writes) |
//! | [`MemoryStore`] | In-process backend, used by tests and ephemeral workers |
//! | [`DiskStore`] | File-backed durable backend |
//! | [`PartitionName`] / [`PartitionSet`] | `<logical>-<version>` naming and the current set |
//! | [`RequestKey`] | Normalized method + URL identity of an entry |
//!
//! ## Example
//!
//! ```rust
//! use offline_cache::cache::{CacheRegistry, MemoryStore, PartitionSet};
//! use offline_cache::types::{Request, Response};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let registry = CacheRegistry::new(Arc::new(MemoryStore::new()));
//! let partitions = PartitionSet::with_version("v1").unwrap();
//! let req = Request::get("https://example.com/app.css").unwrap();
//!
//! registry.put(&partitions.static_assets, &req, &Response::ok("body{}")).await.unwrap();
//! assert_eq!(registry.total_size().await.unwrap(), 6);
//! # });
//! ```

mod backend;
mod disk;
mod key;
mod manager;
mod partition;

pub use backend::{CacheEntry, CacheStore, MemoryStore};
pub use disk::DiskStore;
pub use key::RequestKey;
pub use manager::{CacheRegistry, CacheStats};
pub use partition::{PartitionName, PartitionSet};
