//! Monitor layer: debounced reachability tracking for a group of targets.
//!
//! This module provides types and functions for:
//! - Per-group settings ([`GroupSettings`])
//! - Confirming a change stays stable ([`StabilityConfirmer`], [`Confirmation`])
//! - Per-target evaluation and the status cache ([`TargetMonitor`], [`TickOutcome`])
//! - The periodic loop ([`MonitorLoop`], [`LoopSummary`])
//! - Graceful and immediate shutdown ([`Shutdown`])

mod confirm;
mod context;
mod runner;
mod settings;
mod shutdown;
mod target_monitor;

#[cfg(test)]
mod test_fixtures;

#[cfg(test)]
mod runner_tests;
#[cfg(test)]
mod target_monitor_tests;

pub use confirm::{Confirmation, REPROBE_SPACING, StabilityConfirmer};
pub use context::MonitorContext;
pub use runner::{LoopSummary, MonitorLoop};
pub use settings::{DEFAULT_INTERVAL, GroupSettings};
pub use shutdown::Shutdown;
pub use target_monitor::{TargetMonitor, TickOutcome};
