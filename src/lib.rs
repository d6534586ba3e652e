//! # offline-cache
//!
//! A request-interception cache manager: it sits between a web client and the network,
//! routes every intercepted request to a caching strategy and manages the lifecycle of
//! versioned cache partitions.
//!
//! ## Overview
//!
//! - **Cache Registry**: named, versioned partitions (`static-v1`, `dynamic-v1`,
//!   `generic-v1`) over a pluggable durable store
//! - **Strategy Selector**: classifies a request as cache-first, stale-while-revalidate or
//!   network-first, or lets it bypass the cache entirely
//! - **Strategy Executors**: reconcile a request against cache and network
//! - **Lifecycle Manager**: install (pre-warm), activate (garbage-collect old partitions),
//!   and claim of already-open clients
//! - **Control Channel**: `SKIP_WAITING`, `CLEAR_CACHE` and `GET_CACHE_SIZE` messages
//!
//! Host events (install, activate, fetch, message) are dispatched through an
//! [`events::EventBus`], so every handler can be exercised directly with a constructed
//! event.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use offline_cache::prelude::*;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> offline_cache::Result<()> {
//!     let config = WorkerConfig::new(Url::parse("https://prompts.example.com")?);
//!     let worker = CacheWorker::builder(config).build()?;
//!
//!     worker.install().await?;
//!     worker.activate().await?;
//!
//!     let resp = worker.respond(&Request::get("https://prompts.example.com/api/data")?).await?;
//!     println!("HTTP {}", resp.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Partitions, stores and the cache registry |
//! | [`strategy`] | Classification and the three strategy executors |
//! | [`lifecycle`] | Install / activate / claim and the lifecycle state machine |
//! | [`control`] | Control channel messages and reply ports |
//! | [`events`] | Event bus for host-delivered events |
//! | [`worker`] | The [`worker::CacheWorker`] facade and its builder |
//! | [`transport`] | Network access ([`transport::Fetcher`], reqwest-backed fetcher) |
//! | [`config`] | YAML + environment configuration |
//! | [`telemetry`] | Typed cache events and sinks |
//! | [`types`] | Request and response values |

pub mod cache;
pub mod config;
pub mod control;
pub mod events;
pub mod lifecycle;
pub mod prelude;
pub mod strategy;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod worker;

pub use worker::{CacheWorker, CacheWorkerBuilder};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
