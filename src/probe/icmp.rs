//! ICMP echo probe backed by the system `ping` program.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::{DEFAULT_TIMEOUT, Probe, ProbeError, into_reachability};
use crate::target::Reachability;

/// Extra time allowed for the ping process to start and exit.
const PROCESS_GRACE: Duration = Duration::from_millis(500);

/// How the platform's `ping` reads its reply timeout.
///
/// Only [`WaitUnit::CURRENT`] is used outside tests on a given target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(test), allow(dead_code))]
pub(super) enum WaitUnit {
    /// Windows: `-n 1 -w <milliseconds>`.
    WindowsMillis,
    /// macOS and FreeBSD: `-c 1 -W <milliseconds>`.
    BsdMillis,
    /// Linux iputils, busybox and other Unix: `-c 1 -W <whole seconds>`.
    Seconds,
}

impl WaitUnit {
    #[cfg(windows)]
    pub(super) const CURRENT: Self = Self::WindowsMillis;

    #[cfg(any(target_os = "macos", target_os = "freebsd"))]
    pub(super) const CURRENT: Self = Self::BsdMillis;

    #[cfg(not(any(windows, target_os = "macos", target_os = "freebsd")))]
    pub(super) const CURRENT: Self = Self::Seconds;
}

/// Builds the arguments for a single echo request to `address`.
///
/// Whole-second waits round up and never drop below one second.
pub(super) fn ping_args(unit: WaitUnit, timeout: Duration, address: &str) -> Vec<String> {
    let millis = timeout.as_millis().max(1);
    let (count_flag, wait_flag, wait) = match unit {
        WaitUnit::WindowsMillis => ("-n", "-w", millis),
        WaitUnit::BsdMillis => ("-c", "-W", millis),
        WaitUnit::Seconds => ("-c", "-W", millis.div_ceil(1000)),
    };

    vec![
        count_flag.to_string(),
        "1".to_string(),
        wait_flag.to_string(),
        wait.to_string(),
        address.to_string(),
    ]
}

/// ICMP probe that sends a single echo request via the system `ping`.
///
/// Raw ICMP sockets need elevated privileges, while the system `ping` is
/// normally installed setuid or with `CAP_NET_RAW`, so the probe shells out
/// to it. The child process is killed if the probe is dropped mid-flight.
#[derive(Debug, Clone)]
pub struct IcmpProbe {
    program: String,
    timeout: Duration,
}

impl IcmpProbe {
    /// Default program name, resolved through `PATH`.
    pub const DEFAULT_PROGRAM: &'static str = "ping";

    /// Creates a probe using `ping` from `PATH` and a one-second timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: Self::DEFAULT_PROGRAM.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the ping program (name or path).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the reply timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured ping program.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn command(&self, address: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(ping_args(WaitUnit::CURRENT, self.timeout, address))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }

    async fn try_check(&self, address: &str) -> Result<(), ProbeError> {
        if address.is_empty() || address.starts_with('-') {
            return Err(ProbeError::InvalidAddress(address.to_string()));
        }

        let status = tokio::time::timeout(
            self.timeout + PROCESS_GRACE,
            self.command(address).status(),
        )
        .await
        .map_err(|_| ProbeError::Timeout(self.timeout))?
        .map_err(|source| ProbeError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProbeError::NoReply {
                code: status.code(),
            })
        }
    }
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for IcmpProbe {
    async fn check(&self, address: &str) -> Reachability {
        into_reachability("ICMP", address, self.try_check(address).await)
    }
}
