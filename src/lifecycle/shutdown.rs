//! Shutdown coordination for the gateway.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that the server (and any other long-running
/// task) subscribes to.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How a drained task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Finished within the grace period.
    Completed,
    /// Still running at the deadline and aborted.
    Aborted,
}

/// Wait up to `grace` for `task`, then abort it.
pub async fn drain<T>(mut task: JoinHandle<T>, grace: Duration) -> DrainOutcome {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(_) => DrainOutcome::Completed,
        Err(_) => {
            task.abort();
            DrainOutcome::Aborted
        }
    }
}
