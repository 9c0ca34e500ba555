//! The periodic loop driving one group's monitor.

use std::time::Duration;

use super::target_monitor::{TargetMonitor, TickOutcome};
use super::{GroupSettings, MonitorContext, Shutdown};
use crate::alert::AlertDispatcher;
use crate::probe::Probe;
use crate::state::StatusStore;
use crate::time::{Clock, SystemClock, sleep_unless_cancelled};

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    /// Cycles in which every target was evaluated.
    pub cycles: u64,
    /// Confirmed transitions that were announced.
    pub alerts: u64,
}

/// Runs ticks over a group's targets until shutdown.
///
/// Each cycle evaluates every target once, in configuration order, then
/// waits for the interval. Nothing that happens to one target (probe,
/// store or delivery failure) stops the loop or affects other targets.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use reachwatch::monitor::{GroupSettings, MonitorContext, MonitorLoop, Shutdown};
///
/// let context = MonitorContext::new(probe, store, dispatcher, formatter, recipients);
/// let shutdown = Shutdown::new();
/// let summary = MonitorLoop::new(settings, context).run(shutdown).await;
/// ```
pub struct MonitorLoop<P, S, D, C = SystemClock> {
    monitor: TargetMonitor,
    context: MonitorContext<P, S, D, C>,
    interval: Duration,
}

impl<P, S, D, C> MonitorLoop<P, S, D, C>
where
    P: Probe,
    S: StatusStore,
    D: AlertDispatcher,
    C: Clock,
{
    /// Creates a loop for the group described by `settings`.
    #[must_use]
    pub fn new(settings: GroupSettings, context: MonitorContext<P, S, D, C>) -> Self {
        let confirm_window = settings.confirm_window();
        let interval = settings.interval();
        let monitor = TargetMonitor::new(
            settings.group().to_string(),
            settings.targets().to_vec(),
            confirm_window,
        );

        Self {
            monitor,
            context,
            interval,
        }
    }

    /// Returns the per-target monitor and its cache.
    #[must_use]
    pub const fn monitor(&self) -> &TargetMonitor {
        &self.monitor
    }

    /// Returns the shared collaborators.
    #[must_use]
    pub const fn context(&self) -> &MonitorContext<P, S, D, C> {
        &self.context
    }

    /// Seeds the cache from the store.
    pub async fn seed(&mut self) -> usize {
        self.monitor.seed(self.context.store.as_ref()).await
    }

    /// Evaluates every target once, stopping early on a stop request.
    ///
    /// Returns the outcomes of the targets that were evaluated.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> Vec<TickOutcome> {
        let mut outcomes = Vec::with_capacity(self.monitor.targets().len());

        for index in 0..self.monitor.targets().len() {
            if shutdown.is_stop_requested() {
                break;
            }
            let outcome = self
                .monitor
                .tick(index, &self.context, shutdown.terminate_token())
                .await;
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Seeds the cache and runs cycles until `shutdown` stops the loop.
    pub async fn run(mut self, shutdown: Shutdown) -> LoopSummary {
        let group = self.monitor.group().to_string();
        let resumed = self.seed().await;
        tracing::info!(
            "Monitoring group {group}: {} target(s), {} resumed from stored status, interval {}s, confirmation window {}s",
            self.monitor.targets().len(),
            resumed,
            self.interval.as_secs(),
            self.monitor.confirm_window()
        );

        let mut summary = LoopSummary::default();
        loop {
            let outcomes = self.run_cycle(&shutdown).await;
            for outcome in &outcomes {
                if matches!(outcome, TickOutcome::Confirmed { .. }) {
                    summary.alerts += 1;
                }
            }
            if outcomes.len() == self.monitor.targets().len() {
                summary.cycles += 1;
            }

            if shutdown.is_stop_requested() {
                break;
            }

            if !sleep_unless_cancelled(self.interval, shutdown.stop_token()).await {
                break;
            }
        }

        tracing::info!(
            "Stopped monitoring group {group} after {} cycle(s), {} alert(s)",
            summary.cycles,
            summary.alerts
        );
        summary
    }
}
