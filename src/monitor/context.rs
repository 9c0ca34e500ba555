//! Collaborators a monitor loop needs besides its own state.

use std::sync::Arc;

use crate::alert::{AlertDispatcher, AlertFormatter};
use crate::time::{Clock, SystemClock};

/// Everything a group's monitor uses that it does not own exclusively.
///
/// Probe, store and formatter are shared between groups; the dispatcher
/// and recipients belong to the group.
///
/// # Type Parameters
///
/// * `P` - The [`crate::probe::Probe`] used for every check
/// * `S` - The [`crate::state::StatusStore`] holding confirmed statuses
/// * `D` - The [`AlertDispatcher`] delivering alerts to recipients
/// * `C` - The [`Clock`] stamping alerts (defaults to [`SystemClock`])
pub struct MonitorContext<P, S, D, C = SystemClock> {
    pub(super) probe: Arc<P>,
    pub(super) store: Arc<S>,
    pub(super) dispatcher: D,
    pub(super) formatter: Arc<AlertFormatter>,
    pub(super) clock: C,
    pub(super) recipients: Vec<String>,
}

impl<P, S, D> MonitorContext<P, S, D, SystemClock>
where
    D: AlertDispatcher,
{
    /// Creates a context using the system clock.
    #[must_use]
    pub const fn new(
        probe: Arc<P>,
        store: Arc<S>,
        dispatcher: D,
        formatter: Arc<AlertFormatter>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            probe,
            store,
            dispatcher,
            formatter,
            clock: SystemClock,
            recipients,
        }
    }
}

impl<P, S, D, C> MonitorContext<P, S, D, C>
where
    C: Clock,
{
    /// Replaces the clock used for alert timestamps.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> MonitorContext<P, S, D, C2> {
        MonitorContext {
            probe: self.probe,
            store: self.store,
            dispatcher: self.dispatcher,
            formatter: self.formatter,
            clock,
            recipients: self.recipients,
        }
    }

    /// Returns the chat identifiers alerts are sent to.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Returns the alert dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &D {
        &self.dispatcher
    }
}
