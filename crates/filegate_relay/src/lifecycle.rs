#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Interval between dirty-flag inspections by the flush worker.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(10);
/// Grace given to in-flight requests after an authorized shutdown request.
pub const SHUTDOWN_ACK_DELAY: Duration = Duration::from_secs(5);
/// Hard ceiling on the Draining phase before the process gives up.
pub const DRAIN_MAX: Duration = Duration::from_secs(10);

/// Ordered lifecycle of the relay process. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Starting,
    Loading,
    Serving,
    Draining,
    Stopped,
}

impl LifecyclePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecyclePhase::Starting => "STARTING",
            LifecyclePhase::Loading => "LOADING",
            LifecyclePhase::Serving => "SERVING",
            LifecyclePhase::Draining => "DRAINING",
            LifecyclePhase::Stopped => "STOPPED",
        }
    }

    fn rank(self) -> u8 {
        match self {
            LifecyclePhase::Starting => 0,
            LifecyclePhase::Loading => 1,
            LifecyclePhase::Serving => 2,
            LifecyclePhase::Draining => 3,
            LifecyclePhase::Stopped => 4,
        }
    }
}

/// Tracks the current phase; observers (the health route) read it via
/// `phase()`.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<LifecyclePhase>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::channel(LifecyclePhase::Starting).0),
        }
    }

    /// Moves to `next` if it is further along than the current phase;
    /// regressions are ignored.
    pub fn advance(&self, next: LifecyclePhase) {
        self.tx.send_if_modified(|current| {
            if next.rank() > current.rank() {
                *current = next;
                true
            } else {
                false
            }
        });
    }

    pub fn phase(&self) -> LifecyclePhase {
        *self.tx.borrow()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot drain trigger shared by the shutdown route, the signal
/// listener, and the serve loop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::channel(false).0),
        }
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called; immediately if it already
    /// was.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_lifecycle_01_phases_only_move_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), LifecyclePhase::Starting);
        lifecycle.advance(LifecyclePhase::Loading);
        lifecycle.advance(LifecyclePhase::Serving);
        assert_eq!(lifecycle.phase(), LifecyclePhase::Serving);

        lifecycle.advance(LifecyclePhase::Loading);
        assert_eq!(lifecycle.phase(), LifecyclePhase::Serving);

        lifecycle.advance(LifecyclePhase::Draining);
        lifecycle.advance(LifecyclePhase::Stopped);
        assert_eq!(lifecycle.phase(), LifecyclePhase::Stopped);
    }

    #[tokio::test]
    async fn at_lifecycle_02_shutdown_handle_resolves_after_trigger() {
        let handle = ShutdownHandle::new();
        assert!(!handle.is_triggered());
        handle.trigger();
        assert!(handle.is_triggered());
        // Resolves immediately once triggered, including for late waiters.
        handle.triggered().await;
    }
}
