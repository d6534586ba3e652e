//! Common imports.
//!
//! ```rust
//! use offline_cache::prelude::*;
//! ```

pub use crate::cache::{CacheRegistry, CacheStore, DiskStore, MemoryStore, PartitionSet};
pub use crate::config::{StoreConfig, WorkerConfig};
pub use crate::control::{ControlCommand, ControlMessage, ControlReply, ReplyPort};
pub use crate::events::{EventBus, EventKind, EventOutcome, WorkerEvent};
pub use crate::lifecycle::LifecycleState;
pub use crate::strategy::{ClassificationRules, Route, Strategy};
pub use crate::telemetry::{CacheEvent, CacheEventSink};
pub use crate::transport::{Fetcher, HttpFetcher};
pub use crate::types::{Request, Response};
pub use crate::worker::{CacheWorker, CacheWorkerBuilder};
pub use crate::{Error, Result};
