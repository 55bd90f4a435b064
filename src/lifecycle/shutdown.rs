//! Teardown coordination for background loops.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Coordinator for tearing down background work (status polling).
///
/// Provides a broadcast channel that long-running tasks subscribe to, and
/// remembers that it fired so loops started afterwards exit immediately.
#[derive(Debug)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    triggered: AtomicBool,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            already: self.triggered.load(Ordering::SeqCst),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    /// Whether `trigger` has been called.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the shutdown signal.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    already: bool,
}

impl ShutdownSignal {
    /// Resolve once shutdown has been triggered.
    ///
    /// A closed channel counts as shutdown: nobody is left to keep the loop alive.
    pub async fn recv(&mut self) {
        if self.already {
            return;
        }
        let _ = self.rx.recv().await;
        self.already = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn subscriber_sees_trigger() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_millis(100), signal.recv())
            .await
            .expect("signal should resolve");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn late_subscriber_resolves_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let mut signal = shutdown.subscribe();
        tokio::time::timeout(Duration::from_millis(100), signal.recv())
            .await
            .expect("late subscriber should not wait");
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let shutdown = Shutdown::new();
        let a = shutdown.subscribe();
        let _b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);
        drop(a);
        assert_eq!(shutdown.receiver_count(), 1);
    }
}
