//! Per-group monitoring parameters.

use std::time::Duration;

use crate::target::Target;

/// Default time between two ticks of a group.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// What one monitor loop watches and how often.
///
/// The confirmation window defaults to the interval in whole seconds.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use reachwatch::monitor::GroupSettings;
/// use reachwatch::target::Target;
///
/// let settings = GroupSettings::new("office", vec![Target::new("10.0.0.1", "office")])
///     .with_interval(Duration::from_secs(30));
/// assert_eq!(settings.confirm_window(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSettings {
    group: String,
    targets: Vec<Target>,
    interval: Duration,
    confirm_window: Option<u32>,
}

impl GroupSettings {
    /// Creates settings with the default interval.
    #[must_use]
    pub fn new(group: impl Into<String>, targets: Vec<Target>) -> Self {
        Self {
            group: group.into(),
            targets,
            interval: DEFAULT_INTERVAL,
            confirm_window: None,
        }
    }

    /// Sets the time between ticks.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the confirmation window in seconds.
    #[must_use]
    pub const fn with_confirm_window(mut self, seconds: u32) -> Self {
        self.confirm_window = Some(seconds);
        self
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

    /// Returns the time between ticks.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the confirmation window in seconds.
    #[must_use]
    pub fn confirm_window(&self) -> u32 {
        self.confirm_window.unwrap_or_else(|| {
            u32::try_from(self.interval.as_secs()).unwrap_or(u32::MAX)
        })
    }
}
