use super::builder::CacheWorkerBuilder;
use super::handlers;
use crate::cache::{CacheRegistry, CacheStats, PartitionSet};
use crate::config::WorkerConfig;
use crate::control::{ControlCommand, ControlMessage, ControlReply, ReplyPort};
use crate::events::EventBus;
use crate::lifecycle::{Activation, Clients, LifecycleManager, LifecycleState};
use crate::strategy::{executor_for, Classifier, ExecutionContext, Route};
use crate::telemetry::CacheEvent;
use crate::types::{Request, Response};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct WorkerInner {
    pub(crate) id: String,
    pub(crate) ctx: ExecutionContext,
    pub(crate) classifier: Classifier,
    pub(crate) lifecycle: LifecycleManager,
    pub(crate) config: WorkerConfig,
}

/// The request-interception cache manager. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct CacheWorker {
    pub(crate) inner: Arc<WorkerInner>,
}

/// Facts-only snapshot of the worker.
#[derive(Debug, Clone)]
pub struct WorkerSignals {
    pub state: LifecycleState,
    pub stats: CacheStats,
    pub revalidations_in_flight: usize,
    pub clients: usize,
    pub uncontrolled_clients: usize,
}

impl CacheWorker {
    pub fn builder(config: WorkerConfig) -> CacheWorkerBuilder {
        CacheWorkerBuilder::new(config)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.state()
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.inner.lifecycle
    }

    pub fn registry(&self) -> &CacheRegistry {
        &self.inner.ctx.registry
    }

    pub fn classifier(&self) -> &Classifier {
        &self.inner.classifier
    }

    pub fn clients(&self) -> &Clients {
        self.inner.lifecycle.clients()
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.inner.ctx.partitions
    }

    pub fn signals(&self) -> WorkerSignals {
        WorkerSignals {
            state: self.state(),
            stats: self.registry().stats(),
            revalidations_in_flight: self.inner.ctx.revalidations.in_flight(),
            clients: self.clients().len(),
            uncontrolled_clients: self.clients().uncontrolled().len(),
        }
    }

    pub fn route(&self, request: &Request) -> Route {
        self.inner.classifier.route(request)
    }

    pub async fn install(&self) -> Result<()> {
        self.inner.lifecycle.install().await
    }

    pub async fn activate(&self) -> Result<Activation> {
        self.inner.lifecycle.activate().await
    }

    /// Run the strategy for an intercepted request. `Ok(None)` means the request bypasses
    /// the cache layer and should go to the network untouched.
    pub async fn handle_fetch(&self, request: &Request) -> Result<Option<Response>> {
        match self.route(request) {
            Route::Bypass(reason) => {
                self.inner
                    .ctx
                    .emit(CacheEvent::Bypassed {
                        url: request.url().to_string(),
                        reason: reason.as_str().to_string(),
                    })
                    .await;
                Ok(None)
            }
            Route::Cache(strategy) => {
                let partition = self.inner.ctx.partitions.for_strategy(strategy);
                debug!(url = %request.url(), strategy = %strategy, partition = %partition, "routing request");
                let response = executor_for(strategy)
                    .execute(&self.inner.ctx, request, partition)
                    .await?;
                Ok(Some(response))
            }
        }
    }

    /// Like [`CacheWorker::handle_fetch`], but bypassed requests are sent to the network
    /// directly. Errors are returned unchanged.
    pub async fn fetch(&self, request: &Request) -> Result<Response> {
        match self.handle_fetch(request).await? {
            Some(response) => Ok(response),
            None => self.inner.ctx.fetcher.fetch(request).await,
        }
    }

    /// Host-facing interception: like [`CacheWorker::handle_fetch`], but an unavailable
    /// resource becomes an explicit 503 response. Every other error is returned.
    pub async fn intercept(&self, request: &Request) -> Result<Option<Response>> {
        match self.handle_fetch(request).await {
            Err(Error::Unavailable { reason, .. }) => Ok(Some(Response::unavailable(reason))),
            other => other,
        }
    }

    /// [`CacheWorker::intercept`] with bypassed requests sent to the network directly.
    pub async fn respond(&self, request: &Request) -> Result<Response> {
        match self.intercept(request).await? {
            Some(response) => Ok(response),
            None => self.inner.ctx.fetcher.fetch(request).await,
        }
    }

    /// Handle one control message. Commands that reply always send exactly one reply on
    /// `reply`; the others close it.
    pub async fn handle_message(
        &self,
        message: &ControlMessage,
        reply: Option<&ReplyPort>,
    ) -> Result<()> {
        let command = message.command();
        let result = match &command {
            ControlCommand::SkipWaiting => self.inner.lifecycle.skip_waiting().await,
            ControlCommand::ClearCache => {
                let outcome = match self.clear().await {
                    Ok(_) => ControlReply::cleared(),
                    Err(e) => {
                        warn!(error = %e, "CLEAR_CACHE failed");
                        ControlReply::clear_failed(e.to_string())
                    }
                };
                send_reply(reply, outcome);
                Ok(())
            }
            ControlCommand::GetCacheSize => {
                let outcome = match self.cache_size().await {
                    Ok(size) => ControlReply::size(size),
                    Err(e) => {
                        warn!(error = %e, "GET_CACHE_SIZE failed");
                        ControlReply::size_failed(e.to_string())
                    }
                };
                send_reply(reply, outcome);
                Ok(())
            }
            ControlCommand::Unknown(kind) => {
                self.inner
                    .ctx
                    .emit(CacheEvent::ControlIgnored { kind: kind.clone() })
                    .await;
                Ok(())
            }
        };
        if !command.expects_reply() {
            if let Some(port) = reply {
                port.close();
            }
        }
        result
    }

    /// Send `message` and wait for its reply, if the command has one.
    pub async fn post_message(&self, message: &ControlMessage) -> Result<Option<ControlReply>> {
        let (port, rx) = ReplyPort::channel();
        self.handle_message(message, Some(&port)).await?;
        Ok(rx.await.ok())
    }

    pub async fn cache_size(&self) -> Result<u64> {
        self.registry().total_size().await
    }

    /// Delete every partition. Returns the deleted names.
    pub async fn clear(&self) -> Result<Vec<String>> {
        let deleted = self.registry().delete_all().await?;
        self.inner
            .ctx
            .emit(CacheEvent::CacheCleared {
                deleted: deleted.clone(),
            })
            .await;
        Ok(deleted)
    }

    /// Wait for in-flight background revalidations.
    pub async fn settle(&self) {
        self.inner.ctx.revalidations.settle().await;
    }

    /// An event bus with the default install, activate, fetch and message handlers
    /// registered at priority 0.
    pub fn event_bus(&self) -> EventBus {
        let bus = EventBus::new();
        handlers::register_defaults(&bus, self);
        bus
    }
}

fn send_reply(port: Option<&ReplyPort>, reply: ControlReply) {
    if let Some(port) = port {
        if !port.send(reply) {
            debug!("control reply dropped: caller hung up or already replied");
        }
    }
}
