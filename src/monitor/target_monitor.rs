//! Per-target evaluation: probe, compare with the cache, confirm, commit.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use super::MonitorContext;
use super::confirm::{Confirmation, StabilityConfirmer};
use crate::alert::{Alert, AlertDispatcher};
use crate::probe::Probe;
use crate::state::StatusStore;
use crate::target::{Reachability, Target, TargetStatus};
use crate::time::Clock;

/// What a single tick did for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// First observation in this session; recorded without an alert.
    Initialized(Reachability),
    /// The probe agreed with the cached status.
    Steady(Reachability),
    /// A change was confirmed, persisted and announced.
    Confirmed {
        /// Status before the change.
        from: Reachability,
        /// Newly confirmed status.
        to: Reachability,
    },
    /// A change was observed but a re-probe disagreed.
    Reverted {
        /// 1-based index of the disagreeing re-probe.
        second: u32,
    },
    /// Termination interrupted the evaluation; nothing was committed.
    Abandoned,
}

/// Owns the status cache for one group's targets.
///
/// The cache holds exactly one entry per target once [`seed`](Self::seed)
/// has run. Statuses only advance after a change has been confirmed,
/// persisted and handed to the dispatcher, in that order.
#[derive(Debug)]
pub struct TargetMonitor {
    group: String,
    targets: Vec<Target>,
    cache: HashMap<String, TargetStatus>,
    confirmer: StabilityConfirmer,
}

impl TargetMonitor {
    /// Creates a monitor with every target `Unknown`.
    #[must_use]
    pub fn new(group: impl Into<String>, targets: Vec<Target>, confirm_window: u32) -> Self {
        let cache = targets
            .iter()
            .map(|t| (t.address().to_string(), TargetStatus::Unknown))
            .collect();
        Self {
            group: group.into(),
            targets,
            cache,
            confirmer: StabilityConfirmer::new(confirm_window),
        }
    }

    /// Returns the group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the targets in evaluation order.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Returns the confirmation window in seconds.
    #[must_use]
    pub const fn confirm_window(&self) -> u32 {
        self.confirmer.window()
    }

    /// Returns the cached status of `address`.
    #[must_use]
    pub fn status(&self, address: &str) -> TargetStatus {
        self.cache.get(address).copied().unwrap_or_default()
    }

    /// Loads the last confirmed status of every target from `store`.
    ///
    /// Stored statuses count as confirmed and are never announced. Missing
    /// entries and read failures leave the target `Unknown`. Returns the
    /// number of targets that resumed from a stored status.
    pub async fn seed<S: StatusStore>(&mut self, store: &S) -> usize {
        let mut resumed = 0;

        for target in &self.targets {
            let status = match store.last_status(target.address(), &self.group).await {
                Ok(Some(stored)) => {
                    resumed += 1;
                    TargetStatus::from(stored)
                }
                Ok(None) => TargetStatus::Unknown,
                Err(e) => {
                    tracing::error!("Failed to load stored status of {target}: {e}");
                    TargetStatus::Unknown
                }
            };
            tracing::debug!("Seeded {target} in group {} as {status}", self.group);
            self.cache.insert(target.address().to_string(), status);
        }

        resumed
    }

    /// Evaluates the target at `index` once.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub async fn tick<P, S, D, C>(
        &mut self,
        index: usize,
        ctx: &MonitorContext<P, S, D, C>,
        terminate: &CancellationToken,
    ) -> TickOutcome
    where
        P: Probe,
        S: StatusStore,
        D: AlertDispatcher,
        C: Clock,
    {
        let target = &self.targets[index];

        let observed = tokio::select! {
            biased;

            () = terminate.cancelled() => return TickOutcome::Abandoned,
            observed = ctx.probe.check(target.address()) => observed,
        };

        let cached = self.cache.get(target.address()).copied().unwrap_or_default();

        let outcome = match cached.reachability() {
            None => {
                tracing::info!("{target}: first observation, {observed}");
                Self::persist(ctx, &self.group, target, observed).await;
                TickOutcome::Initialized(observed)
            }
            Some(current) if current == observed => {
                tracing::debug!("{target}: still {observed}");
                TickOutcome::Steady(observed)
            }
            Some(current) => {
                Self::evaluate_change(
                    &self.confirmer,
                    ctx,
                    &self.group,
                    target,
                    current,
                    observed,
                    terminate,
                )
                .await
            }
        };

        match outcome {
            TickOutcome::Initialized(status) | TickOutcome::Confirmed { to: status, .. } => {
                self.cache
                    .insert(target.address().to_string(), TargetStatus::from(status));
            }
            TickOutcome::Steady(_) | TickOutcome::Reverted { .. } | TickOutcome::Abandoned => {}
        }

        outcome
    }

    async fn evaluate_change<P, S, D, C>(
        confirmer: &StabilityConfirmer,
        ctx: &MonitorContext<P, S, D, C>,
        group: &str,
        target: &Target,
        current: Reachability,
        candidate: Reachability,
        terminate: &CancellationToken,
    ) -> TickOutcome
    where
        P: Probe,
        S: StatusStore,
        D: AlertDispatcher,
        C: Clock,
    {
        tracing::info!(
            "{target}: {current} -> {candidate} observed, confirming over {}s",
            confirmer.window()
        );

        match confirmer
            .confirm(ctx.probe.as_ref(), target.address(), candidate, terminate)
            .await
        {
            Confirmation::Confirmed => {
                tracing::info!("{target}: {current} -> {candidate} confirmed");
                Self::persist(ctx, group, target, candidate).await;
                Self::announce(ctx, target, candidate).await;
                TickOutcome::Confirmed {
                    from: current,
                    to: candidate,
                }
            }
            Confirmation::Reverted { second, observed } => {
                tracing::info!(
                    "{target}: change to {candidate} reverted at second {second} ({observed}), ignored"
                );
                TickOutcome::Reverted { second }
            }
            Confirmation::Abandoned { second } => {
                tracing::info!(
                    "{target}: confirmation abandoned at second {second}, nothing committed"
                );
                TickOutcome::Abandoned
            }
        }
    }

    /// Stores `status` under the monitor's group, the key [`Self::seed`] reads.
    async fn persist<P, S, D, C>(
        ctx: &MonitorContext<P, S, D, C>,
        group: &str,
        target: &Target,
        status: Reachability,
    ) where
        S: StatusStore,
    {
        if let Err(e) = ctx
            .store
            .set_status(target.address(), group, status)
            .await
        {
            tracing::error!("Failed to persist status of {target}: {e}");
        }
    }

    async fn announce<P, S, D, C>(
        ctx: &MonitorContext<P, S, D, C>,
        target: &Target,
        status: Reachability,
    ) where
        D: AlertDispatcher,
        C: Clock,
    {
        let message = ctx.formatter.render(&Alert {
            target,
            status,
            at: ctx.clock.now(),
        });

        let report = ctx.dispatcher.dispatch(&message, &ctx.recipients).await;
        if report.failed() > 0 {
            tracing::warn!(
                "Alert for {target} reached {}/{} recipient(s)",
                report.delivered(),
                report.outcomes().len()
            );
        } else {
            tracing::debug!(
                "Alert for {target} delivered to {} recipient(s)",
                report.delivered()
            );
        }
    }
}
