//! 缓存策略模块：请求分类以及缓存优先、后台重新验证、网络优先三种执行器。
//!
//! # Strategy Module
//!
//! Classification of intercepted requests and the three executors that reconcile a request
//! against cache and network.
//!
//! | Strategy | Partition | Cache hit | Cache miss | Network failure |
//! |----------|-----------|-----------|------------|-----------------|
//! | [`CacheFirst`] | static | served, no network | fetch, store 2xx | error propagated |
//! | [`StaleWhileRevalidate`] | dynamic | served, refreshed in background | fetch, store 2xx | swallowed if cached, else propagated |
//! | [`NetworkFirst`] | generic | only used on failure | fetch, store 2xx | any partition, else unavailable |
//!
//! Only 2xx responses are ever written; see [`crate::cache::CacheRegistry::put`].

mod cache_first;
mod network_first;
mod revalidation;
mod selector;
mod stale_while_revalidate;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use revalidation::Revalidations;
pub use selector::{ClassificationRules, Classifier};
pub use stale_while_revalidate::StaleWhileRevalidate;

use crate::cache::{CacheRegistry, PartitionName, PartitionSet};
use crate::telemetry::{self, CacheEvent, CacheEventSink};
use crate::transport::Fetcher;
use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    CacheFirst,
    StaleWhileRevalidate,
    NetworkFirst,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::CacheFirst => "cache-first",
            Strategy::StaleWhileRevalidate => "stale-while-revalidate",
            Strategy::NetworkFirst => "network-first",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    NonReadMethod,
    NonWebScheme,
}

impl BypassReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BypassReason::NonReadMethod => "non-GET method",
            BypassReason::NonWebScheme => "non-web scheme",
        }
    }
}

/// Outcome of classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not handled by the cache layer; the request goes to the network untouched.
    Bypass(BypassReason),
    Cache(Strategy),
}

/// Shared collaborators every executor works against. Cheap to clone.
#[derive(Clone)]
pub struct ExecutionContext {
    pub registry: CacheRegistry,
    pub fetcher: Arc<dyn Fetcher>,
    pub partitions: PartitionSet,
    pub sink: Arc<dyn CacheEventSink>,
    pub revalidations: Revalidations,
}

impl ExecutionContext {
    pub(crate) async fn emit(&self, event: CacheEvent) {
        telemetry::emit(self.sink.as_ref(), event).await;
    }

    /// Write a network response to `partition`, reporting the outcome.
    ///
    /// A failed write is reported as [`CacheEvent::StoreFailed`] and never fails the request:
    /// the caller still holds a good network response.
    pub(crate) async fn store(
        &self,
        partition: &PartitionName,
        request: &Request,
        response: &Response,
    ) -> bool {
        let (stored, event) = match self.registry.put(partition, request, response).await {
            Ok(true) => (
                true,
                CacheEvent::Stored {
                    partition: partition.to_string(),
                    url: request.url().to_string(),
                    bytes: response.body_len(),
                },
            ),
            Ok(false) => (
                false,
                CacheEvent::NotStored {
                    partition: partition.to_string(),
                    url: request.url().to_string(),
                    status: response.status,
                },
            ),
            Err(e) => (
                false,
                CacheEvent::StoreFailed {
                    partition: partition.to_string(),
                    url: request.url().to_string(),
                    error: e.to_string(),
                },
            ),
        };
        self.emit(event).await;
        stored
    }
}

/// One caching policy.
#[async_trait]
pub trait Executor: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        request: &Request,
        partition: &PartitionName,
    ) -> Result<Response>;
}

/// Executor for a strategy.
pub fn executor_for(strategy: Strategy) -> &'static dyn Executor {
    match strategy {
        Strategy::CacheFirst => &CacheFirst,
        Strategy::StaleWhileRevalidate => &StaleWhileRevalidate,
        Strategy::NetworkFirst => &NetworkFirst,
    }
}
