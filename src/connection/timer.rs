//! Owned, cancellable scheduled tasks.
//!
//! A [`ScheduledTask`] aborts its tokio task when dropped, so replacing or
//! clearing the field that holds it is enough to cancel the timer.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

// ============================================================================
// ScheduledTask
// ============================================================================

/// Handle to a one-shot or periodic timer task.
#[derive(Debug)]
pub(crate) struct ScheduledTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Runs `f` once after `delay`.
    pub(crate) fn after(
        name: &'static str,
        delay: Duration,
        f: impl FnOnce() + Send + 'static,
    ) -> Self {
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            trace!(timer = name, "Timer fired");
            f();
        });
        Self { name, handle }
    }

    /// Runs `f` every `period`, first after one full period.
    pub(crate) fn every(
        name: &'static str,
        period: Duration,
        mut f: impl FnMut() + Send + 'static,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!(timer = name, "Timer tick");
                f();
            }
        });
        Self { name, handle }
    }

    /// Returns `true` once a one-shot timer has run.
    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        trace!(timer = self.name, "Timer cancelled");
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
