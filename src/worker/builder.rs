use super::core::{CacheWorker, WorkerInner};
use crate::cache::{CacheRegistry, CacheStore};
use crate::config::WorkerConfig;
use crate::lifecycle::{Clients, LifecycleManager};
use crate::strategy::{Classifier, ExecutionContext, Revalidations};
use crate::telemetry::{CacheEventSink, TracingEventSink};
use crate::transport::{Fetcher, HttpFetcher};
use crate::Result;
use std::sync::Arc;

/// Builder for [`CacheWorker`].
///
/// Every collaborator has a default: the store comes from the config, the network is an
/// [`HttpFetcher`] and events go to `tracing`.
pub struct CacheWorkerBuilder {
    config: WorkerConfig,
    store: Option<Arc<dyn CacheStore>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    sink: Arc<dyn CacheEventSink>,
    clients: Option<Clients>,
    worker_id: Option<String>,
}

impl CacheWorkerBuilder {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            store: None,
            fetcher: None,
            sink: Arc::new(TracingEventSink),
            clients: None,
            worker_id: None,
        }
    }

    /// Inject the storage backend (overrides `config.store`).
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Inject the network.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn CacheEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Share a client registry with another worker (e.g. the one being replaced).
    pub fn clients(mut self, clients: Clients) -> Self {
        self.clients = Some(clients);
        self
    }

    pub fn worker_id(mut self, id: impl Into<String>) -> Self {
        self.worker_id = Some(id.into());
        self
    }

    pub fn build(self) -> Result<CacheWorker> {
        let partitions = self.config.partition_set()?;
        let precache = self.config.precache_urls()?;
        let classifier = Classifier::new(&self.config.rules)?;

        let store = match self.store {
            Some(store) => store,
            None => self.config.build_store(),
        };
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new()?),
        };
        let id = self
            .worker_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let ctx = ExecutionContext {
            registry: CacheRegistry::new(store),
            fetcher,
            partitions,
            sink: self.sink,
            revalidations: Revalidations::new(),
        };
        let lifecycle = LifecycleManager::new(
            id.clone(),
            ctx.clone(),
            precache,
            self.clients.unwrap_or_default(),
        );

        Ok(CacheWorker {
            inner: Arc::new(WorkerInner {
                id,
                ctx,
                classifier,
                lifecycle,
                config: self.config,
            }),
        })
    }
}
