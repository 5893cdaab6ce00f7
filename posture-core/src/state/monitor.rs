//! Periodic recheck loop
//!
//! The loop is tied to a [`MonitorHandle`]: cancelling or dropping the
//! handle stops it, so no recheck runs after its owner is gone.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::manager::SecurityStateManager;

/// Spawns periodic `recheck()` calls against a manager
pub struct RecheckMonitor;

impl RecheckMonitor {
    /// Recheck every `interval` until cancelled
    pub fn spawn(manager: Arc<SecurityStateManager>, interval: Duration) -> MonitorHandle {
        Self::start(manager, interval, None)
    }

    /// Recheck every `interval`, stopping on its own after `cycles` rechecks
    pub fn spawn_bounded(
        manager: Arc<SecurityStateManager>,
        interval: Duration,
        cycles: usize,
    ) -> MonitorHandle {
        Self::start(manager, interval, Some(cycles))
    }

    fn start(
        manager: Arc<SecurityStateManager>,
        interval: Duration,
        cycles: Option<usize>,
    ) -> MonitorHandle {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;

            info!(interval_ms = interval.as_millis() as u64, "Recheck monitor started");
            let mut completed = 0usize;

            while cycles.is_none_or(|limit| completed < limit) {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Recheck monitor cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        match manager.recheck().await {
                            Ok(summary) => debug!(
                                violations = summary.violation_count,
                                "Periodic recheck complete"
                            ),
                            Err(e) => warn!(error = %e, "Periodic recheck failed"),
                        }
                        completed += 1;
                    }
                }
            }

            info!(rechecks = completed, "Recheck monitor stopped");
            completed
        });

        MonitorHandle {
            shutdown,
            task: Some(task),
        }
    }
}

/// Owner of a running recheck loop; dropping it cancels the loop
pub struct MonitorHandle {
    shutdown: CancellationToken,
    task: Option<JoinHandle<usize>>,
}

impl MonitorHandle {
    /// Stop the loop; an in-flight recheck finishes first
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Wait for the loop to end, returns the number of rechecks it ran
    pub async fn join(mut self) -> usize {
        let Some(task) = self.task.take() else {
            return 0;
        };
        match task.await {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "Recheck monitor task failed");
                0
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
