use std::future::Future;
use tokio_util::task::TaskTracker;

/// Tracks fire-and-forget background refreshes.
///
/// Callers never wait on these tasks; [`Revalidations::settle`] exists for shutdown and
/// tests that need to observe the refreshed cache.
#[derive(Clone, Default)]
pub struct Revalidations {
    tracker: TaskTracker,
}

impl Revalidations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every refresh spawned so far has finished.
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
