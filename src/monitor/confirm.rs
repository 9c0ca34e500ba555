//! Stability confirmation of an observed status change.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::probe::Probe;
use crate::target::Reachability;
use crate::time::sleep_unless_cancelled;

/// Spacing between confirmation re-probes.
pub const REPROBE_SPACING: Duration = Duration::from_secs(1);

/// Result of a confirmation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// Every re-probe agreed with the candidate status.
    Confirmed,
    /// The re-probe at `second` disagreed; the window was cut short.
    Reverted {
        /// 1-based index of the disagreeing re-probe.
        second: u32,
        /// What that re-probe returned.
        observed: Reachability,
    },
    /// Termination was requested during step `second`.
    Abandoned {
        /// 1-based index of the interrupted step.
        second: u32,
    },
}

/// Re-probes a target once per second to confirm a candidate status.
///
/// A window of `n` seconds performs up to `n` re-probes, stopping at the
/// first one that differs from the candidate. A window of zero confirms
/// immediately without probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityConfirmer {
    window: u32,
}

impl StabilityConfirmer {
    /// Creates a confirmer with a window of `window` seconds.
    #[must_use]
    pub const fn new(window: u32) -> Self {
        Self { window }
    }

    /// Returns the window length in seconds.
    #[must_use]
    pub const fn window(&self) -> u32 {
        self.window
    }

    /// Confirms that `address` stays at `candidate` for the whole window.
    ///
    /// `terminate` is checked before each step and raced against every
    /// sleep and probe.
    pub async fn confirm<P: Probe>(
        &self,
        probe: &P,
        address: &str,
        candidate: Reachability,
        terminate: &CancellationToken,
    ) -> Confirmation {
        for second in 1..=self.window {
            if !sleep_unless_cancelled(REPROBE_SPACING, terminate).await {
                return Confirmation::Abandoned { second };
            }

            let observed = tokio::select! {
                biased;

                () = terminate.cancelled() => return Confirmation::Abandoned { second },
                observed = probe.check(address) => observed,
            };

            tracing::debug!(
                "Re-probe {second}/{} of {address}: {observed}",
                self.window
            );

            if observed != candidate {
                return Confirmation::Reverted { second, observed };
            }
        }

        Confirmation::Confirmed
    }
}
