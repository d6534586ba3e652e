//! Default event handlers binding host events to a [`CacheWorker`].

use super::core::CacheWorker;
use crate::events::{EventBus, EventHandler, EventKind, EventOutcome, WorkerEvent};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const INSTALL_HANDLER: &str = "precache";
pub const ACTIVATE_HANDLER: &str = "cleanup-and-claim";
pub const FETCH_HANDLER: &str = "strategies";
pub const MESSAGE_HANDLER: &str = "control";

pub(crate) fn register_defaults(bus: &EventBus, worker: &CacheWorker) {
    let handler = Arc::new(WorkerHandler {
        worker: worker.clone(),
    });
    bus.register(EventKind::Install, INSTALL_HANDLER, 0, handler.clone());
    bus.register(EventKind::Activate, ACTIVATE_HANDLER, 0, handler.clone());
    bus.register(EventKind::Fetch, FETCH_HANDLER, 0, handler.clone());
    bus.register(EventKind::Message, MESSAGE_HANDLER, 0, handler);
}

struct WorkerHandler {
    worker: CacheWorker,
}

#[async_trait]
impl EventHandler for WorkerHandler {
    async fn handle(&self, event: &WorkerEvent) -> Result<EventOutcome> {
        match event {
            WorkerEvent::Install => {
                self.worker.install().await?;
                Ok(EventOutcome::Done)
            }
            WorkerEvent::Activate => {
                self.worker.activate().await?;
                Ok(EventOutcome::Done)
            }
            // Bypassed requests fall through to the host's own network handling.
            WorkerEvent::Fetch(request) => match self.worker.intercept(request).await? {
                Some(response) => Ok(EventOutcome::Respond(response)),
                None => Ok(EventOutcome::Continue),
            },
            WorkerEvent::Message { message, reply } => {
                self.worker.handle_message(message, reply.as_ref()).await?;
                Ok(EventOutcome::Done)
            }
        }
    }
}
