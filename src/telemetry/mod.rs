//! 遥测模块：缓存事件的记录与收集（命中、写入、回退、生命周期变化）。
//!
//! Cache event telemetry.
//!
//! Every routing decision, cache hit/miss, write, fallback and lifecycle transition is
//! reported to a [`CacheEventSink`] as a typed [`CacheEvent`]. This is also where failures
//! with no waiting caller end up, most notably background revalidation errors.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheEvent`] | Typed event enum |
//! | [`CacheEventSink`] | Trait for event destinations |
//! | [`TracingEventSink`] | Default sink: forwards events to `tracing` |
//! | [`InMemoryEventSink`] | Bounded in-memory sink for tests |
//! | [`CompositeEventSink`] | Multi-destination composite sink |
//! | [`NoopEventSink`] | Drops everything |

use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Bypassed { url: String, reason: String },
    Hit { partition: String, url: String },
    Miss { partition: String, url: String },
    Stored { partition: String, url: String, bytes: u64 },
    NotStored { partition: String, url: String, status: u16 },
    /// The response was served but could not be written to the cache.
    StoreFailed { partition: String, url: String, error: String },
    Revalidated { partition: String, url: String, stored: bool },
    RevalidationFailed { url: String, error: String },
    NetworkFallback { partition: String, url: String, error: String },
    Unavailable { url: String, reason: String },
    Installed { partition: String, entries: usize },
    InstallFailed { error: String },
    Activated { deleted: Vec<String>, claimed: usize },
    CacheCleared { deleted: Vec<String> },
    ControlIgnored { kind: String },
}

impl CacheEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheEvent::Bypassed { .. } => "bypassed",
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Stored { .. } => "stored",
            CacheEvent::NotStored { .. } => "not_stored",
            CacheEvent::StoreFailed { .. } => "store_failed",
            CacheEvent::Revalidated { .. } => "revalidated",
            CacheEvent::RevalidationFailed { .. } => "revalidation_failed",
            CacheEvent::NetworkFallback { .. } => "network_fallback",
            CacheEvent::Unavailable { .. } => "unavailable",
            CacheEvent::Installed { .. } => "installed",
            CacheEvent::InstallFailed { .. } => "install_failed",
            CacheEvent::Activated { .. } => "activated",
            CacheEvent::CacheCleared { .. } => "cache_cleared",
            CacheEvent::ControlIgnored { .. } => "control_ignored",
        }
    }
}

#[async_trait]
pub trait CacheEventSink: Send + Sync {
    async fn report(&self, event: CacheEvent) -> Result<()>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Report `event`, swallowing sink failures.
pub async fn emit(sink: &dyn CacheEventSink, event: CacheEvent) {
    if let Err(e) = sink.report(event).await {
        warn!(error = %e, "cache event sink failed");
    }
}

pub struct NoopEventSink;

#[async_trait]
impl CacheEventSink for NoopEventSink {
    async fn report(&self, _event: CacheEvent) -> Result<()> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn CacheEventSink> {
    Arc::new(NoopEventSink)
}

/// Forwards events to `tracing`. Failures are logged at `warn`, lifecycle at `info`,
/// per-request traffic at `debug`.
#[derive(Default)]
pub struct TracingEventSink;

#[async_trait]
impl CacheEventSink for TracingEventSink {
    async fn report(&self, event: CacheEvent) -> Result<()> {
        match &event {
            CacheEvent::StoreFailed { partition, url, error } => {
                warn!(partition = %partition, url = %url, error = %error, "cache write failed, response served uncached")
            }
            CacheEvent::RevalidationFailed { url, error } => {
                warn!(url = %url, error = %error, "background revalidation failed")
            }
            CacheEvent::NetworkFallback { partition, url, error } => {
                warn!(partition = %partition, url = %url, error = %error, "network failed, served from cache")
            }
            CacheEvent::Unavailable { url, reason } => {
                warn!(url = %url, reason = %reason, "request unavailable")
            }
            CacheEvent::InstallFailed { error } => warn!(error = %error, "install failed"),
            CacheEvent::ControlIgnored { kind } => {
                warn!(kind = %kind, "ignoring unrecognized control message")
            }
            CacheEvent::Installed { partition, entries } => {
                info!(partition = %partition, entries, "pre-warm complete")
            }
            CacheEvent::Activated { deleted, claimed } => {
                info!(deleted = ?deleted, claimed, "activated")
            }
            CacheEvent::CacheCleared { deleted } => info!(deleted = ?deleted, "cache cleared"),
            other => debug!(kind = other.kind(), event = ?other, "cache event"),
        }
        Ok(())
    }
}

/// In-memory sink for testing.
pub struct InMemoryEventSink {
    events: Arc<RwLock<Vec<CacheEvent>>>,
    max_events: usize,
}

impl InMemoryEventSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max,
        }
    }

    pub fn events(&self) -> Vec<CacheEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_of_kind(&self, kind: &str) -> Vec<CacheEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl CacheEventSink for InMemoryEventSink {
    async fn report(&self, event: CacheEvent) -> Result<()> {
        let mut events = self.events.write().map_err(|_| {
            crate::Error::runtime_with_context(
                "event sink poisoned",
                crate::ErrorContext::new().with_source("in_memory_sink"),
            )
        })?;
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }
}

/// Composite sink for multiple destinations.
#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn CacheEventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(mut self, sink: Arc<dyn CacheEventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl CacheEventSink for CompositeEventSink {
    async fn report(&self, event: CacheEvent) -> Result<()> {
        for s in &self.sinks {
            let _ = s.report(event.clone()).await;
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        for s in &self.sinks {
            let _ = s.close().await;
        }
        Ok(())
    }
}
