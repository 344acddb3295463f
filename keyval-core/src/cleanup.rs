//! Background task that periodically sweeps expired entries.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{Result, StoreError};

/// Work performed on every cleanup tick.
pub(crate) trait Sweeper: Send + Sync + 'static {
    /// Removes expired entries and persists, returning how many were removed
    fn sweep_and_persist(&self) -> Result<usize>;
}

/// Handle to a running cleanup task.
///
/// The task only holds a weak reference to its target and exits on its own
/// once the target is dropped.
pub(crate) struct CleanupTask {
    /// Sender to signal shutdown to the cleanup task
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CleanupTask {
    /// Spawns the task on the current Tokio runtime.
    ///
    /// The first tick fires immediately; later ticks are at least `interval`
    /// apart, measured from the end of a slow tick rather than bunched up.
    pub(crate) fn spawn<S: Sweeper>(target: Weak<S>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(StoreError::InvalidCleanupInterval);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = runtime.spawn(run(target, interval, shutdown_rx));
        tracing::info!("Auto cleanup started, interval: {:?}", interval);

        Ok(Self { shutdown_tx, handle })
    }

    /// Signals the task to stop after its current tick
    pub(crate) fn stop(self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run<S: Sweeper>(
    target: Weak<S>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(target) = target.upgrade() else {
                    break;
                };
                // Sweeping holds the store lock and writes the file; keep it off the async workers
                match tokio::task::spawn_blocking(move || target.sweep_and_persist()).await {
                    Ok(Ok(removed)) => {
                        if removed > 0 {
                            tracing::debug!(removed = removed, "Cleaned up expired keys");
                        }
                    }
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "Cleanup tick failed, retrying on next tick");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Cleanup tick did not complete");
                    }
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    tracing::info!("Auto cleanup stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingSweeper {
        ticks: AtomicUsize,
        fail: bool,
    }

    impl Sweeper for CountingSweeper {
        fn sweep_and_persist(&self) -> Result<usize> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::KeyNotFound("tick".to_string()));
            }
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_ticks_until_stopped() {
        let sweeper = Arc::new(CountingSweeper::default());
        let task = CleanupTask::spawn(Arc::downgrade(&sweeper), Duration::from_millis(10)).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let ticks = sweeper.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 2, "expected several ticks, got {ticks}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sweeper.ticks.load(Ordering::SeqCst), ticks);
    }

    #[tokio::test]
    async fn test_failing_ticks_keep_running() {
        let sweeper = Arc::new(CountingSweeper {
            ticks: AtomicUsize::new(0),
            fail: true,
        });
        let task = CleanupTask::spawn(Arc::downgrade(&sweeper), Duration::from_millis(10)).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(sweeper.ticks.load(Ordering::SeqCst) >= 2);
        assert!(!task.is_finished());
        task.stop();
    }

    #[tokio::test]
    async fn test_exits_when_target_dropped() {
        let sweeper = Arc::new(CountingSweeper::default());
        let task = CleanupTask::spawn(Arc::downgrade(&sweeper), Duration::from_millis(10)).unwrap();

        drop(sweeper);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(task.is_finished());
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let sweeper = Arc::new(CountingSweeper::default());
        let result = CleanupTask::spawn(Arc::downgrade(&sweeper), Duration::ZERO);
        assert!(matches!(result, Err(StoreError::InvalidCleanupInterval)));
    }

    #[test]
    fn test_requires_runtime() {
        let sweeper = Arc::new(CountingSweeper::default());
        let result = CleanupTask::spawn(Arc::downgrade(&sweeper), Duration::from_secs(1));
        assert!(matches!(result, Err(StoreError::NoRuntime)));
    }
}
