//! Configuration layer for reachwatch.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Target list expansion, including IPv4 ranges ([`expand_targets`])
//! - Validated configuration ([`ValidatedConfig`], [`GroupConfig`], [`ProbeConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file; for
//!    `interval`, `confirm_window` and `bot_token` a group's own value
//!    wins over the global section
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! Groups and their targets exist only in the config file. `--group`
//! selects a subset of them.
//!
//! # Confirmation Window
//!
//! When no `confirm_window` is set anywhere, it equals the group's interval
//! in seconds. A window of 0 announces a change on first sight.

mod cli;
pub mod defaults;
mod error;
mod targets;
mod toml;
mod validated;


pub use cli::{Cli, Command, ProbeKindArg};
pub use error::{ConfigError, field};
pub use targets::expand_targets;
pub use toml::{
    AlertSection, GroupSection, MonitorSection, ProbeSection, Recipient, TargetEntry,
    TelegramSection, TomlConfig, default_config_template,
};
pub use validated::{
    GroupConfig, ProbeConfig, ProbeKind, ResetConfig, ValidatedConfig, write_default_config,
};
