//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::FixedOffset;
use url::Url;

use crate::alert::{AlertFormatter, DEFAULT_TEMPLATE, parse_utc_offset};
use crate::monitor::GroupSettings;
use crate::probe::{ConfiguredProbe, IcmpProbe, TcpProbe};
use crate::target::Target;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::targets::expand_targets;
use super::toml::{GroupSection, TomlConfig};

/// Probe method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// ICMP echo through the system ping program.
    Icmp,
    /// TCP connect.
    Tcp,
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Icmp => write!(f, "icmp"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Validated probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Probe method
    pub kind: ProbeKind,
    /// Timeout of a single probe
    pub timeout: Duration,
    /// Port for TCP probes of addresses without one
    pub tcp_port: u16,
    /// Program used for ICMP probes
    pub ping_program: String,
}

impl ProbeConfig {
    /// Builds the configured probe.
    #[must_use]
    pub fn build(&self) -> ConfiguredProbe {
        match self.kind {
            ProbeKind::Icmp => ConfiguredProbe::Icmp(
                IcmpProbe::new()
                    .with_program(self.ping_program.clone())
                    .with_timeout(self.timeout),
            ),
            ProbeKind::Tcp => ConfiguredProbe::Tcp(
                TcpProbe::new()
                    .with_default_port(self.tcp_port)
                    .with_timeout(self.timeout),
            ),
        }
    }
}

/// One validated group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// Group ("object") name
    pub name: String,
    /// Targets in evaluation order
    pub targets: Vec<Target>,
    /// Telegram chat ids
    pub recipients: Vec<String>,
    /// Time between ticks
    pub interval: Duration,
    /// Confirmation window in seconds
    pub confirm_window: u32,
    /// Bot token; `None` only in dry-run mode
    pub bot_token: Option<String>,
}

impl From<&GroupConfig> for GroupSettings {
    fn from(group: &GroupConfig) -> Self {
        Self::new(group.name.clone(), group.targets.clone())
            .with_interval(group.interval)
            .with_confirm_window(group.confirm_window)
    }
}

/// Fully validated configuration ready for use by the application.
///
/// This struct represents a complete, validated configuration where all
/// required fields are present and all values have been validated.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and a parsed TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Groups selected for monitoring
    pub groups: Vec<GroupConfig>,

    /// Probe settings shared by every group
    pub probe: ProbeConfig,

    /// Offset of alert timestamps
    pub utc_offset: FixedOffset,

    /// Alert template (validated)
    pub template: String,

    /// Telegram Bot API base URL
    pub api_base: Url,

    /// Path to state file for resuming across restarts.
    /// If `None`, statuses are kept in memory only.
    pub state_file: Option<PathBuf>,

    /// Log file appended to besides the console.
    pub log_file: Option<PathBuf>,

    /// Dry-run mode (log alerts without sending them)
    pub dry_run: bool,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_file_str = self
            .state_file
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());
        let log_file_str = self
            .log_file
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());
        let groups: Vec<&str> = self.groups.iter().map(|g| g.name.as_str()).collect();
        let targets: usize = self.groups.iter().map(|g| g.targets.len()).sum();

        write!(
            f,
            "Config {{ groups: [{}], targets: {}, probe: {} ({}ms), utc_offset: {}, \
             state_file: {}, log_file: {}, dry_run: {} }}",
            groups.join(", "),
            targets,
            self.probe.kind,
            self.probe.timeout.as_millis(),
            self.utc_offset,
            state_file_str,
            log_file_str,
            self.dry_run,
        )
    }
}

/// Settings of the `reset` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetConfig {
    /// Group whose stored statuses are cleared
    pub group: String,
    /// State file to clear them from
    pub state_file: Option<PathBuf>,
    /// File that logs are appended to
    pub log_file: Option<PathBuf>,
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and the TOML config.
    ///
    /// CLI arguments take precedence over TOML config values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No group is configured or selected
    /// - A group is missing a name, targets, recipients, or a bot token
    /// - A target entry is invalid or duplicated
    /// - A duration is zero
    /// - The UTC offset, template, or API URL is invalid
    pub fn from_raw(cli: &Cli, toml: &TomlConfig) -> Result<Self, ConfigError> {
        let probe = Self::resolve_probe(cli, toml)?;

        let utc_offset = Self::resolve_utc_offset(toml)?;

        let template = toml
            .alert
            .template
            .clone()
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        AlertFormatter::new(&template, utc_offset)?;

        let api_base = Self::resolve_api_base(toml)?;

        let groups = Self::resolve_groups(cli, toml)?;

        Ok(Self {
            groups,
            probe,
            utc_offset,
            template,
            api_base,
            state_file: Self::resolve_state_file(cli, toml),
            log_file: Self::resolve_log_file(cli, toml),
            dry_run: cli.dry_run,
            verbose: cli.verbose,
        })
    }

    /// Loads the config file named by the CLI (or the default path) and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = TomlConfig::load(&cli.config_path())?;
        Self::from_raw(cli, &toml)
    }

    /// Resolves the settings of `reset --group <group>`.
    ///
    /// Groups are not validated beyond their names. `group` must name a
    /// `[[group]]` of the config file, so the config file is always read.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - No configured group is named `group`
    pub fn load_reset(cli: &Cli, group: &str) -> Result<ResetConfig, ConfigError> {
        let toml = TomlConfig::load(&cli.config_path())?;
        Self::reset_from_raw(cli, &toml, group)
    }

    /// Resolves the settings of `reset` from an already parsed config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownGroup`] if no configured group is named `group`.
    pub fn reset_from_raw(
        cli: &Cli,
        toml: &TomlConfig,
        group: &str,
    ) -> Result<ResetConfig, ConfigError> {
        if !toml.groups.iter().any(|s| s.name.trim() == group) {
            return Err(ConfigError::UnknownGroup(group.to_string()));
        }

        Ok(ResetConfig {
            group: group.to_string(),
            state_file: Self::resolve_state_file(cli, toml),
            log_file: Self::resolve_log_file(cli, toml),
        })
    }

    fn resolve_probe(cli: &Cli, toml: &TomlConfig) -> Result<ProbeConfig, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let kind = match (cli.probe, toml.probe.kind.as_deref()) {
            (Some(arg), _) => arg.into(),
            (None, Some(value)) => parse_probe_kind(value)?,
            (None, None) => ProbeKind::Icmp,
        };

        let timeout_ms = cli
            .probe_timeout_ms
            .or(toml.probe.timeout_ms)
            .unwrap_or(defaults::PROBE_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.timeout_ms",
                reason: "must be greater than 0".to_string(),
            });
        }

        let tcp_port = cli
            .tcp_port
            .or(toml.probe.tcp_port)
            .unwrap_or(defaults::TCP_PORT);
        if tcp_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.tcp_port",
                reason: "must be greater than 0".to_string(),
            });
        }

        let ping_program = toml
            .probe
            .ping_program
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| defaults::PING_PROGRAM.to_string());

        Ok(ProbeConfig {
            kind,
            timeout: Duration::from_millis(timeout_ms),
            tcp_port,
            ping_program,
        })
    }

    fn resolve_utc_offset(toml: &TomlConfig) -> Result<FixedOffset, ConfigError> {
        let value = toml
            .alert
            .utc_offset
            .as_deref()
            .unwrap_or(defaults::UTC_OFFSET);
        parse_utc_offset(value).map_err(|reason| ConfigError::InvalidUtcOffset { reason })
    }

    fn resolve_api_base(toml: &TomlConfig) -> Result<Url, ConfigError> {
        let value = toml
            .telegram
            .api_base
            .as_deref()
            .unwrap_or(defaults::TELEGRAM_API_BASE);

        let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
            url: value.to_string(),
            reason: e.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: value.to_string(),
                reason: "cannot be used as a base URL".to_string(),
            });
        }
        Ok(url)
    }

    fn resolve_groups(cli: &Cli, toml: &TomlConfig) -> Result<Vec<GroupConfig>, ConfigError> {
        if toml.groups.is_empty() {
            return Err(ConfigError::missing(
                field::GROUPS,
                "Add at least one [[group]] table to the config file",
            ));
        }

        let mut names = HashSet::new();
        for section in &toml.groups {
            let name = section.name.trim();
            if name.is_empty() {
                return Err(ConfigError::group(name, "name is empty"));
            }
            if !names.insert(name) {
                return Err(ConfigError::group(name, "defined more than once"));
            }
        }

        if let Some(unknown) = cli.groups.iter().find(|g| !names.contains(g.as_str())) {
            return Err(ConfigError::UnknownGroup(unknown.clone()));
        }

        toml.groups
            .iter()
            .filter(|s| cli.groups.is_empty() || cli.groups.iter().any(|g| g == s.name.trim()))
            .map(|section| Self::resolve_group(cli, toml, section))
            .collect()
    }

    fn resolve_group(
        cli: &Cli,
        toml: &TomlConfig,
        section: &GroupSection,
    ) -> Result<GroupConfig, ConfigError> {
        let name = section.name.trim().to_string();

        let targets = expand_targets(&name, &section.targets)?;
        if targets.is_empty() {
            return Err(ConfigError::group(&name, "has no targets"));
        }

        let recipients: Vec<String> = section
            .recipients
            .iter()
            .map(ToString::to_string)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(ConfigError::group(&name, "has no recipients"));
        }

        // Priority: CLI explicit > group > [monitor] > default
        let interval_secs = cli
            .interval
            .or(section.interval)
            .or(toml.monitor.interval)
            .unwrap_or(defaults::INTERVAL_SECS);
        if interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval",
                reason: format!("group '{name}': must be greater than 0"),
            });
        }

        let confirm_window = cli
            .confirm_window
            .or(section.confirm_window)
            .or(toml.monitor.confirm_window)
            .unwrap_or_else(|| u32::try_from(interval_secs).unwrap_or(u32::MAX));

        let bot_token = section
            .bot_token
            .as_deref()
            .or(toml.telegram.bot_token.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToString::to_string);
        if bot_token.is_none() && !cli.dry_run {
            return Err(ConfigError::missing(
                field::BOT_TOKEN,
                "Set telegram.bot_token or bot_token in the group, or use --dry-run",
            ));
        }

        Ok(GroupConfig {
            name,
            targets,
            recipients,
            interval: Duration::from_secs(interval_secs),
            confirm_window,
            bot_token,
        })
    }

    fn resolve_log_file(cli: &Cli, toml: &TomlConfig) -> Option<PathBuf> {
        cli.log_file
            .clone()
            .or_else(|| toml.monitor.log_file.as_deref().map(PathBuf::from))
            .map(|p| expand_home(&p))
    }

    fn resolve_state_file(cli: &Cli, toml: &TomlConfig) -> Option<PathBuf> {
        // CLI takes precedence
        if let Some(ref path) = cli.state_file {
            return Some(expand_home(path));
        }

        // Fall back to TOML
        toml.monitor
            .state_file
            .as_deref()
            .map(|p| expand_home(Path::new(p)))
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn parse_probe_kind(s: &str) -> Result<ProbeKind, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "icmp" | "ping" => Ok(ProbeKind::Icmp),
        "tcp" => Ok(ProbeKind::Tcp),
        _ => Err(ConfigError::InvalidProbeKind {
            value: s.to_string(),
        }),
    }
}

/// Replaces a leading `~` with the home directory, when one is known.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
