//! Work handlers start after responding, such as import backups.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counts detached tasks so shutdown can wait for them.
#[derive(Clone, Debug, Default)]
pub struct BackgroundTasks {
    pending: Arc<AtomicUsize>,
}

/// Decrements the pending count when the task ends, even by panic.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl BackgroundTasks {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` onto the runtime and count it until it finishes.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let guard = PendingGuard(Arc::clone(&self.pending));
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    /// Tasks still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Wait until every counted task has finished.
    ///
    /// # Errors
    ///
    /// Returns the number still running when `timeout` expires.
    pub async fn drain(&self, timeout: Duration) -> Result<(), usize> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(20);

        loop {
            let pending = self.pending();
            if pending == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(pending);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn drain_waits_for_spawned_work() {
        let tasks = BackgroundTasks::new();
        let (done_tx, done_rx) = oneshot::channel();

        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = done_tx.send(());
        });
        assert_eq!(tasks.pending(), 1);

        assert_eq!(tasks.drain(Duration::from_secs(5)).await, Ok(()));
        assert_eq!(tasks.pending(), 0);
        assert!(done_rx.await.is_ok());
    }

    #[tokio::test]
    async fn drain_reports_stragglers_after_the_timeout() {
        let tasks = BackgroundTasks::new();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        tasks.spawn(async move {
            let _ = release_rx.await;
        });

        assert_eq!(tasks.drain(Duration::from_millis(60)).await, Err(1));

        let _ = release_tx.send(());
        assert_eq!(tasks.drain(Duration::from_secs(5)).await, Ok(()));
    }

    #[tokio::test]
    #[allow(clippy::panic)] // The task under test has to panic
    async fn panicking_tasks_are_not_counted_forever() {
        let tasks = BackgroundTasks::new();
        tasks.spawn(async {
            panic!("backup task failed");
        });

        assert_eq!(tasks.drain(Duration::from_secs(5)).await, Ok(()));
    }
}
