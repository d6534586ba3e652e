//! 生命周期模块：安装预缓存、激活时清理旧分区并接管客户端。
//!
//! # Lifecycle Module
//!
//! Install (pre-warm), activate (garbage collection) and takeover (client claim), with the
//! worker state tracked as a [`LifecycleState`].
//!
//! | Transition | Trigger | Effect |
//! |------------|---------|--------|
//! | installing → waiting | install event | static partition filled from the precache manifest |
//! | installing → redundant | install event | any manifest fetch failed; nothing written |
//! | waiting → active | activate event, or `SKIP_WAITING` | stale partitions deleted, clients claimed |
//! | active → active | activate event after `SKIP_WAITING` | nothing |

mod clients;
mod manager;
mod state;

pub use clients::{ClientInfo, Clients};
pub use manager::{Activation, LifecycleManager};
pub use state::LifecycleState;
