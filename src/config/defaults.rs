//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default configuration file path.
pub const CONFIG_PATH: &str = "reachwatch.toml";

/// Default time between ticks in seconds.
pub const INTERVAL_SECS: u64 = 10;

/// Default probe timeout in milliseconds.
pub const PROBE_TIMEOUT_MS: u64 = 1000;

/// Default TCP port for addresses without one.
pub const TCP_PORT: u16 = 80;

/// Default ICMP program.
pub const PING_PROGRAM: &str = "ping";

/// Default UTC offset for alert timestamps.
pub const UTC_OFFSET: &str = "+02:00";

/// Default Telegram Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Largest number of addresses one IPv4 range may expand to.
pub const MAX_RANGE_ADDRESSES: u32 = 4096;

/// Default interval as Duration.
#[must_use]
pub const fn interval() -> Duration {
    Duration::from_secs(INTERVAL_SECS)
}

/// Default probe timeout as Duration.
#[must_use]
pub const fn probe_timeout() -> Duration {
    Duration::from_millis(PROBE_TIMEOUT_MS)
}
