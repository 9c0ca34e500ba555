//! Core types for monitored targets and their reachability status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One monitored network endpoint within a group.
///
/// Targets are immutable for the lifetime of a monitoring run; a
/// configuration change requires restarting the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    address: String,
    display_name: String,
    group: String,
}

impl Target {
    /// Creates a target whose display name is its address.
    #[must_use]
    pub fn new(address: impl Into<String>, group: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            display_name: address.clone(),
            address,
            group: group.into(),
        }
    }

    /// Sets the human-readable label.
    ///
    /// `None` or a blank name keeps the address as the label.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<&str>) -> Self {
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            self.display_name = name.to_string();
        }
        self
    }

    /// The probed address (IP literal or hostname, optionally with a port).
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The human-readable label used in alerts and logs.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The group ("object") this target belongs to.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name == self.address {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} ({})", self.display_name, self.address)
        }
    }
}

/// Outcome of a single probe; the only status that is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    /// The target answered.
    Reachable,
    /// The target did not answer, or the probe itself failed.
    Unreachable,
}

impl Reachability {
    /// Maps a boolean probe outcome.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success {
            Self::Reachable
        } else {
            Self::Unreachable
        }
    }

    /// Returns true for [`Reachability::Reachable`].
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Reachable)
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable => write!(f, "reachable"),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// Cached status of a target within one monitoring session.
///
/// `Unknown` exists only until the first observation of a target; after
/// that the status only moves between the two known values, and only
/// after the change has been confirmed stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetStatus {
    /// Not yet observed in this session and nothing stored.
    #[default]
    Unknown,
    /// Last confirmed as reachable.
    Reachable,
    /// Last confirmed as unreachable.
    Unreachable,
}

impl TargetStatus {
    /// Returns the known reachability, or `None` for `Unknown`.
    #[must_use]
    pub const fn reachability(self) -> Option<Reachability> {
        match self {
            Self::Unknown => None,
            Self::Reachable => Some(Reachability::Reachable),
            Self::Unreachable => Some(Reachability::Unreachable),
        }
    }

    /// Returns true if no observation has been made yet.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<Reachability> for TargetStatus {
    fn from(value: Reachability) -> Self {
        match value {
            Reachability::Reachable => Self::Reachable,
            Reachability::Unreachable => Self::Unreachable,
        }
    }
}

impl From<Option<Reachability>> for TargetStatus {
    fn from(value: Option<Reachability>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reachability() {
            Some(r) => r.fmt(f),
            None => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod target {
        use super::*;

        #[test]
        fn display_name_defaults_to_address() {
            let target = Target::new("10.0.0.1", "office");
            assert_eq!(target.display_name(), "10.0.0.1");
            assert_eq!(target.group(), "office");
        }

        #[test]
        fn with_display_name_sets_label() {
            let target = Target::new("10.0.0.1", "office").with_display_name(Some("Router"));
            assert_eq!(target.display_name(), "Router");
            assert_eq!(target.address(), "10.0.0.1");
        }

        #[test]
        fn blank_display_name_keeps_address() {
            let target = Target::new("10.0.0.1", "office").with_display_name(Some("   "));
            assert_eq!(target.display_name(), "10.0.0.1");

            let target = Target::new("10.0.0.1", "office").with_display_name(None);
            assert_eq!(target.display_name(), "10.0.0.1");
        }

        #[test]
        fn display_includes_address_when_named() {
            let named = Target::new("10.0.0.1", "office").with_display_name(Some("Router"));
            assert_eq!(named.to_string(), "Router (10.0.0.1)");

            let unnamed = Target::new("10.0.0.1", "office");
            assert_eq!(unnamed.to_string(), "10.0.0.1");
        }
    }

    mod reachability {
        use super::*;

        #[test]
        fn from_success_maps_both_values() {
            assert_eq!(Reachability::from_success(true), Reachability::Reachable);
            assert_eq!(
                Reachability::from_success(false),
                Reachability::Unreachable
            );
        }

        #[test]
        fn serializes_lowercase() {
            let json = serde_json::to_string(&Reachability::Unreachable).unwrap();
            assert_eq!(json, "\"unreachable\"");

            let parsed: Reachability = serde_json::from_str("\"reachable\"").unwrap();
            assert_eq!(parsed, Reachability::Reachable);
        }
    }

    mod target_status {
        use super::*;

        #[test]
        fn default_is_unknown() {
            assert!(TargetStatus::default().is_unknown());
            assert_eq!(TargetStatus::default().reachability(), None);
        }

        #[test]
        fn converts_from_optional_reachability() {
            assert_eq!(TargetStatus::from(None), TargetStatus::Unknown);
            assert_eq!(
                TargetStatus::from(Some(Reachability::Reachable)),
                TargetStatus::Reachable
            );
        }

        #[test]
        fn display_matches_reachability() {
            assert_eq!(TargetStatus::Unreachable.to_string(), "unreachable");
            assert_eq!(TargetStatus::Unknown.to_string(), "unknown");
        }
    }
}
