//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::ProbeKind;

/// reachwatch: reachability monitor with debounced alerts
///
/// Probes groups of hosts and sends a Telegram message when a host goes
/// down or comes back, once the change has held for the confirmation
/// window.
#[derive(Debug, Parser)]
#[command(name = "reachwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file [default: reachwatch.toml]
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Only monitor this group (can be specified multiple times)
    #[arg(long = "group", value_name = "NAME")]
    pub groups: Vec<String>,

    /// Seconds between ticks, for every selected group
    #[arg(long)]
    pub interval: Option<u64>,

    /// Confirmation window in seconds, for every selected group
    #[arg(long = "confirm-window", value_name = "SECS")]
    pub confirm_window: Option<u32>,

    /// Probe method
    #[arg(long, value_enum)]
    pub probe: Option<ProbeKindArg>,

    /// Timeout of a single probe in milliseconds
    #[arg(long = "probe-timeout-ms", value_name = "MS")]
    pub probe_timeout_ms: Option<u64>,

    /// TCP port for addresses without an explicit port
    #[arg(long = "tcp-port", value_name = "PORT")]
    pub tcp_port: Option<u16>,

    /// Path to state file for resuming across restarts
    #[arg(long = "state-file", global = true)]
    pub state_file: Option<PathBuf>,

    /// Also append logs to this file
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Test mode - log alerts without sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for reachwatch
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "reachwatch.toml")]
        output: PathBuf,
    },

    /// Forget the stored statuses of a group
    Reset {
        /// Group whose statuses are cleared
        #[arg(long)]
        group: String,
    },
}

/// Probe method argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeKindArg {
    /// ICMP echo through the system ping program
    Icmp,
    /// TCP connect
    Tcp,
}

impl From<ProbeKindArg> for ProbeKind {
    fn from(arg: ProbeKindArg) -> Self {
        match arg {
            ProbeKindArg::Icmp => Self::Icmp,
            ProbeKindArg::Tcp => Self::Tcp,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns the configuration file path, falling back to the default.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(super::defaults::CONFIG_PATH))
    }
}
