//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// Everything except the groups is optional and merged with CLI
/// arguments and built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Monitoring configuration
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Probe configuration
    #[serde(default)]
    pub probe: ProbeSection,

    /// Alert formatting configuration
    #[serde(default)]
    pub alert: AlertSection,

    /// Telegram delivery configuration
    #[serde(default)]
    pub telegram: TelegramSection,

    /// Monitored groups (`[[group]]` tables)
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupSection>,
}

/// Monitoring configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Seconds between ticks
    pub interval: Option<u64>,

    /// Confirmation window in seconds (defaults to the interval)
    pub confirm_window: Option<u32>,

    /// Path to state file
    pub state_file: Option<String>,

    /// File that logs are appended to, besides the console
    pub log_file: Option<String>,
}

/// Probe configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeSection {
    /// "icmp" or "tcp"
    pub kind: Option<String>,

    /// Timeout of a single probe in milliseconds
    pub timeout_ms: Option<u64>,

    /// TCP port for addresses without one
    pub tcp_port: Option<u16>,

    /// Program used for ICMP probes
    pub ping_program: Option<String>,
}

/// Alert formatting section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertSection {
    /// Offset of alert timestamps, e.g. "+02:00"
    pub utc_offset: Option<String>,

    /// Handlebars message template
    pub template: Option<String>,
}

/// Telegram delivery section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramSection {
    /// Bot token used by groups without their own
    pub bot_token: Option<String>,

    /// Bot API base URL
    pub api_base: Option<String>,
}

/// One `[[group]]` table.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupSection {
    /// Group ("object") name
    #[serde(default)]
    pub name: String,

    /// Telegram chat ids alerts are sent to
    #[serde(default)]
    pub recipients: Vec<Recipient>,

    /// Seconds between ticks for this group
    pub interval: Option<u64>,

    /// Confirmation window for this group
    pub confirm_window: Option<u32>,

    /// Bot token for this group
    pub bot_token: Option<String>,

    /// Monitored addresses
    #[serde(default)]
    pub targets: Vec<TargetEntry>,
}

/// A chat id, written either as a number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    /// Numeric chat id
    Id(i64),
    /// Chat id or `@channel` name
    Name(String),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One monitored address, or an IPv4 range `start-end`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
    /// IP address, hostname, `host:port`, or IPv4 range
    pub address: String,

    /// Label used in alerts
    pub name: Option<String>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# reachwatch configuration file

[monitor]
# Seconds between ticks (default: 10)
interval = 10

# Seconds a change must hold before it is announced (default: the interval)
# 0 announces a change as soon as it is seen
# confirm_window = 10

# Remember confirmed statuses across restarts
# Omit to start every run with all targets unknown
state_file = "reachwatch-state.json"

# Also append logs to a file (the console always gets them)
# log_file = "reachwatch.log"

[probe]
# "icmp" (system ping program) or "tcp" (connect)
kind = "icmp"

# Timeout of a single probe in milliseconds (default: 1000)
# timeout_ms = 1000

# Port for TCP probes of addresses without one (default: 80)
# tcp_port = 80

# ping_program = "ping"

[alert]
# Offset of alert timestamps (default: "+02:00")
utc_offset = "+02:00"

# Handlebars message template
# Available variables: {{name}}, {{address}}, {{group}}, {{time}}, {{status}}, {{reachable}}
# template = "{{name}}: [ {{address}} ]\nDate: [ {{time}} ]\nObject: [ {{group}} ]\nStatus: {{status}}"

[telegram]
# Bot token used by groups without their own
# bot_token = "123456:ABC-DEF"

# api_base = "https://api.telegram.org"

[[group]]
name = "office"
recipients = [123456789]
# interval = 10
# confirm_window = 10
# bot_token = "123456:ABC-DEF"
targets = [
    { address = "192.168.1.1", name = "Router" },
    { address = "192.168.1.20-192.168.1.25" },
]
"#
    .to_string()
}
