//! Reply ports.

use super::message::ControlReply;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Sending half of a reply channel. Accepts at most one reply; the type makes a second
/// reply a no-op that reports `false`.
pub struct ReplyPort {
    tx: Mutex<Option<oneshot::Sender<ControlReply>>>,
}

/// Receiving half held by the caller.
pub type ReplyReceiver = oneshot::Receiver<ControlReply>;

impl ReplyPort {
    pub fn channel() -> (ReplyPort, ReplyReceiver) {
        let (tx, rx) = oneshot::channel();
        (
            ReplyPort {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Deliver `reply`. Returns `false` if a reply was already sent or the caller hung up.
    pub fn send(&self, reply: ControlReply) -> bool {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        match tx {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    pub fn is_used(&self) -> bool {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).is_none()
    }

    /// Close the port without replying.
    pub fn close(&self) {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

impl std::fmt::Debug for ReplyPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyPort")
            .field("used", &self.is_used())
            .finish()
    }
}
