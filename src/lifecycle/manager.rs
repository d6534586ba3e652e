use super::clients::Clients;
use super::state::LifecycleState;
use crate::strategy::ExecutionContext;
use crate::telemetry::CacheEvent;
use crate::types::{Request, Response};
use crate::{Error, ErrorContext, Result};
use futures::future::try_join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};
use url::Url;

/// Report of a completed activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub deleted: Vec<String>,
    pub claimed: usize,
}

/// Drives install, activation and client takeover.
pub struct LifecycleManager {
    worker_id: String,
    ctx: ExecutionContext,
    precache: Vec<Url>,
    clients: Clients,
    state: watch::Sender<LifecycleState>,
    skip_waiting: AtomicBool,
    transition: Mutex<()>,
}

impl LifecycleManager {
    pub fn new(
        worker_id: impl Into<String>,
        ctx: ExecutionContext,
        precache: Vec<Url>,
        clients: Clients,
    ) -> Self {
        let (state, _) = watch::channel(LifecycleState::Installing);
        Self {
            worker_id: worker_id.into(),
            ctx,
            precache,
            clients,
            state,
            skip_waiting: AtomicBool::new(false),
            transition: Mutex::new(()),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn precache(&self) -> &[Url] {
        &self.precache
    }

    /// Pre-warm the static partition with the precache manifest.
    ///
    /// All-or-nothing: every manifest entry is fetched and must be 2xx before anything is
    /// written. Any failure moves the worker to `redundant`.
    pub async fn install(&self) -> Result<()> {
        let _guard = self.transition.lock().await;
        self.expect_state(LifecycleState::Installing, "install")?;

        match self.prewarm().await {
            Ok(count) => {
                self.set_state(LifecycleState::Waiting);
                self.ctx
                    .emit(CacheEvent::Installed {
                        partition: self.ctx.partitions.static_assets.to_string(),
                        entries: count,
                    })
                    .await;
            }
            Err(e) => {
                self.set_state(LifecycleState::Redundant);
                self.ctx
                    .emit(CacheEvent::InstallFailed {
                        error: e.to_string(),
                    })
                    .await;
                return Err(e);
            }
        }

        if self.skip_waiting.load(Ordering::SeqCst) {
            debug!("skip-waiting requested during install, activating");
            self.activate_locked().await?;
        }
        Ok(())
    }

    async fn prewarm(&self) -> Result<usize> {
        let requests: Vec<Request> = self
            .precache
            .iter()
            .map(|url| Request::new("GET", url.clone()))
            .collect();

        let fetches = requests.iter().map(|req| self.fetch_manifest_entry(req));
        let responses: Vec<Response> = try_join_all(fetches).await?;

        let partition = &self.ctx.partitions.static_assets;
        self.ctx.registry.open(partition).await?;
        for (req, resp) in requests.iter().zip(responses.iter()) {
            self.ctx.registry.put(partition, req, resp).await?;
        }
        Ok(requests.len())
    }

    async fn fetch_manifest_entry(&self, request: &Request) -> Result<Response> {
        let response = self.ctx.fetcher.fetch(request).await.map_err(|e| {
            Error::install_with_context(
                format!("failed to fetch precache entry: {}", e),
                ErrorContext::new()
                    .with_details(request.url().as_str())
                    .with_source("lifecycle"),
            )
        })?;
        if !response.is_success() {
            return Err(Error::install_with_context(
                format!("precache entry returned HTTP {}", response.status),
                ErrorContext::new()
                    .with_details(request.url().as_str())
                    .with_source("lifecycle"),
            ));
        }
        Ok(response)
    }

    /// Garbage-collect superseded partitions, become active and claim every client.
    ///
    /// Activating an already active worker (for instance after `SKIP_WAITING`) is a no-op
    /// that reports nothing deleted and nothing claimed.
    pub async fn activate(&self) -> Result<Activation> {
        let _guard = self.transition.lock().await;
        if self.state() == LifecycleState::Active {
            debug!(worker = %self.worker_id, "already active");
            return Ok(Activation {
                deleted: Vec::new(),
                claimed: 0,
            });
        }
        self.activate_locked().await
    }

    async fn activate_locked(&self) -> Result<Activation> {
        self.expect_state(LifecycleState::Waiting, "activate")?;

        let keep = self.ctx.partitions.current_names();
        let deleted = self.ctx.registry.delete_all_except(&keep).await?;
        self.set_state(LifecycleState::Active);
        let claimed = self.clients.claim(&self.worker_id);

        self.ctx
            .emit(CacheEvent::Activated {
                deleted: deleted.clone(),
                claimed,
            })
            .await;
        Ok(Activation { deleted, claimed })
    }

    /// Leave `waiting` immediately. While still installing, the request is remembered and
    /// applied once install succeeds; once active it is a no-op.
    pub async fn skip_waiting(&self) -> Result<()> {
        self.skip_waiting.store(true, Ordering::SeqCst);
        let _guard = self.transition.lock().await;
        match self.state() {
            LifecycleState::Waiting => {
                self.activate_locked().await?;
            }
            state => debug!(state = %state, "skip-waiting recorded"),
        }
        Ok(())
    }

    fn expect_state(&self, expected: LifecycleState, operation: &str) -> Result<()> {
        let current = self.state();
        if current == expected {
            Ok(())
        } else {
            Err(Error::runtime_with_context(
                format!("cannot {} while {}", operation, current),
                ErrorContext::new()
                    .with_details(format!("expected state {}", expected))
                    .with_source("lifecycle"),
            ))
        }
    }

    fn set_state(&self, next: LifecycleState) {
        let previous = self.state();
        if previous.can_transition_to(next) {
            info!(from = %previous, to = %next, worker = %self.worker_id, "lifecycle transition");
            self.state.send_replace(next);
        }
    }
}
