//! 缓存工作者模块：组装各组件并对外提供统一的入口。
//!
//! # Worker Module
//!
//! [`CacheWorker`] ties the pieces together: classification, the strategy executors, the
//! lifecycle manager and the control channel, all sharing one [`crate::cache::CacheRegistry`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use offline_cache::config::WorkerConfig;
//! use offline_cache::types::Request;
//! use offline_cache::worker::CacheWorker;
//!
//! # async fn run() -> offline_cache::Result<()> {
//! let config = WorkerConfig::from_yaml_file("offline-cache.yaml")?.apply_env()?;
//! let worker = CacheWorker::builder(config).build()?;
//!
//! worker.install().await?;
//! worker.activate().await?;
//!
//! let response = worker
//!     .respond(&Request::get("https://prompts.example.com/categories/writing")?)
//!     .await?;
//! println!("{} ({} bytes)", response.status, response.body.len());
//! # Ok(())
//! # }
//! ```

mod builder;
mod core;
mod handlers;

pub use builder::CacheWorkerBuilder;
pub use self::core::{CacheWorker, WorkerSignals};
pub use handlers::{ACTIVATE_HANDLER, FETCH_HANDLER, INSTALL_HANDLER, MESSAGE_HANDLER};
