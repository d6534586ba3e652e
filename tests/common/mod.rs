//! Shared fixtures: a scripted network and worker constructors.

#![allow(dead_code)]

use async_trait::async_trait;
use offline_cache::cache::{CacheStore, MemoryStore};
use offline_cache::config::WorkerConfig;
use offline_cache::telemetry::InMemoryEventSink;
use offline_cache::transport::{Fetcher, TransportError};
use offline_cache::types::{Request, Response};
use offline_cache::{CacheWorker, Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const ORIGIN: &str = "https://prompts.example.com";

pub fn url(path: &str) -> String {
    format!("{}{}", ORIGIN, path)
}

pub fn get(path: &str) -> Request {
    Request::get(&url(path)).unwrap()
}

/// Scripted network: per-URL responses, an offline switch and a call log.
/// Unscripted URLs answer 404.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, Response>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls_to(&self, path: &str) -> usize {
        let target = url(path);
        self.calls.lock().unwrap().iter().filter(|u| **u == target).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().unwrap().push(request.url().to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Transport(TransportError::Other(
                "network unreachable".into(),
            )));
        }
        let scripted = self
            .routes
            .lock()
            .unwrap()
            .get(request.url().as_str())
            .cloned();
        Ok(scripted.unwrap_or_else(|| Response::new(404, "not found")))
    }
}

pub fn config() -> WorkerConfig {
    WorkerConfig::new(Url::parse(ORIGIN).unwrap())
}

pub struct Harness {
    pub worker: CacheWorker,
    pub net: Arc<FakeNetwork>,
    pub sink: Arc<InMemoryEventSink>,
}

pub fn harness_with(config: WorkerConfig, store: Arc<dyn CacheStore>) -> Harness {
    let net = FakeNetwork::new();
    let sink = Arc::new(InMemoryEventSink::default());
    let worker = CacheWorker::builder(config)
        .store(store)
        .fetcher(net.clone())
        .event_sink(sink.clone())
        .build()
        .unwrap();
    Harness { worker, net, sink }
}

pub fn harness() -> Harness {
    harness_with(config(), Arc::new(MemoryStore::new()))
}

/// Script the default precache manifest.
pub fn serve_manifest(net: &FakeNetwork) {
    net.serve(
        "/",
        Response::ok("<html>home</html>").with_header("content-type", "text/html"),
    );
    net.serve("/manifest.json", Response::ok(r#"{"name":"Prompt Library"}"#));
    net.serve("/favicon.ico", Response::ok(vec![0u8; 16]));
}
