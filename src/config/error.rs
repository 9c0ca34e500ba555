//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// A numeric setting is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid URL provided.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The invalid URL string
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Unknown probe kind.
    #[error("Invalid probe kind '{value}': expected icmp or tcp")]
    InvalidProbeKind {
        /// The invalid value provided
        value: String,
    },

    /// Invalid UTC offset.
    #[error("Invalid UTC offset: {reason}")]
    InvalidUtcOffset {
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid alert template.
    #[error("Invalid alert template: {0}")]
    InvalidTemplate(#[from] crate::alert::AlertTemplateError),

    /// A group definition is unusable.
    #[error("Invalid group '{group}': {reason}")]
    InvalidGroup {
        /// Group name (may be empty)
        group: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A target entry is unusable.
    #[error("Invalid target '{address}' in group '{group}': {reason}")]
    InvalidTarget {
        /// Group the entry belongs to
        group: String,
        /// The address as written
        address: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A `--group` filter or `reset --group` names a group that is not configured.
    #[error("Unknown group '{0}'")]
    UnknownGroup(String),
}

/// Well-known field names for `MissingRequired` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The list of groups.
    pub const GROUPS: &str = "group";
    /// The Telegram bot token.
    pub const BOT_TOKEN: &str = "bot_token";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }

    /// Creates an `InvalidGroup` error.
    #[must_use]
    pub fn group(group: &str, reason: impl Into<String>) -> Self {
        Self::InvalidGroup {
            group: group.to_string(),
            reason: reason.into(),
        }
    }
}
