//! 事件总线：按优先级将宿主事件分发给已注册的处理器。
//!
//! Event bus.
//!
//! The host runtime delivers install, activate, fetch and message events; each is
//! dispatched to the handlers registered for its [`EventKind`] in priority order (lowest
//! first). The first handler that returns [`EventOutcome::Respond`] or
//! [`EventOutcome::Done`] stops dispatch. Handlers can be invoked directly with a constructed
//! [`WorkerEvent`], no host required.

use crate::control::{ControlMessage, ReplyPort};
use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
}

#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Message {
        message: ControlMessage,
        reply: Option<ReplyPort>,
    },
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorkerEvent::Install => EventKind::Install,
            WorkerEvent::Activate => EventKind::Activate,
            WorkerEvent::Fetch(_) => EventKind::Fetch,
            WorkerEvent::Message { .. } => EventKind::Message,
        }
    }

    pub fn message(message: ControlMessage) -> Self {
        WorkerEvent::Message {
            message,
            reply: None,
        }
    }

    pub fn message_with_reply(message: ControlMessage, reply: ReplyPort) -> Self {
        WorkerEvent::Message {
            message,
            reply: Some(reply),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Not handled here; try the next handler.
    Continue,
    /// A response for a fetch event.
    Respond(Response),
    /// Handled, nothing to return.
    Done,
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &WorkerEvent) -> Result<EventOutcome>;
}

/// Adapts a synchronous closure into an [`EventHandler`].
pub struct FnHandler<F> {
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&WorkerEvent) -> Result<EventOutcome> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&WorkerEvent) -> Result<EventOutcome> + Send + Sync,
{
    async fn handle(&self, event: &WorkerEvent) -> Result<EventOutcome> {
        (self.func)(event)
    }
}

struct Registration {
    name: String,
    priority: i32,
    handler: Arc<dyn EventHandler>,
}

#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Registration>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        kind: EventKind,
        name: impl Into<String>,
        priority: i32,
        handler: Arc<dyn EventHandler>,
    ) {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        let entry = handlers.entry(kind).or_default();
        entry.push(Registration {
            name: name.into(),
            priority,
            handler,
        });
        entry.sort_by_key(|r| r.priority);
    }

    pub fn register_fn<F>(&self, kind: EventKind, name: impl Into<String>, priority: i32, func: F)
    where
        F: Fn(&WorkerEvent) -> Result<EventOutcome> + Send + Sync + 'static,
    {
        self.register(kind, name, priority, Arc::new(FnHandler::new(func)));
    }

    pub fn unregister(&self, kind: EventKind, name: &str) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = handlers.get_mut(&kind) {
            let len = entry.len();
            entry.retain(|r| r.name != name);
            return entry.len() < len;
        }
        false
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn names(&self, kind: EventKind) -> Vec<String> {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map(|v| v.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    pub async fn dispatch(&self, event: &WorkerEvent) -> Result<EventOutcome> {
        let handlers: Vec<Arc<dyn EventHandler>> = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            handlers
                .get(&event.kind())
                .map(|v| v.iter().map(|r| r.handler.clone()).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            match handler.handle(event).await? {
                EventOutcome::Continue => continue,
                outcome => return Ok(outcome),
            }
        }
        Ok(EventOutcome::Continue)
    }
}
