//! 控制通道模块：处理 SKIP_WAITING、CLEAR_CACHE、GET_CACHE_SIZE 等页面消息并回复。
//!
//! # Control Channel
//!
//! Out-of-band commands addressed by the message `type` field.
//!
//! | type | effect | reply |
//! |------|--------|-------|
//! | `SKIP_WAITING` | leave `waiting` immediately | none |
//! | `CLEAR_CACHE` | delete every partition | `{success, error?}` |
//! | `GET_CACHE_SIZE` | sum stored body bytes | `{size}` |
//! | anything else | ignored, logged | none |
//!
//! Replies travel on a [`ReplyPort`] supplied by the caller. Commands without a reply close
//! the port so the caller's receiver resolves instead of hanging.

mod channel;
mod message;

pub use channel::{ReplyPort, ReplyReceiver};
pub use message::{ControlCommand, ControlMessage, ControlReply};
