//! Probe layer for single reachability checks.
//!
//! This module provides:
//! - The [`Probe`] trait, which never fails: transport errors map to
//!   [`Reachability::Unreachable`]
//! - ICMP probing through the system `ping` program ([`IcmpProbe`])
//! - TCP connect probing ([`TcpProbe`])
//! - A configuration-selected probe ([`ConfiguredProbe`])

mod error;
mod icmp;
mod tcp;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use error::ProbeError;
pub use icmp::IcmpProbe;
pub use tcp::TcpProbe;

use std::time::Duration;

use crate::target::Reachability;

/// Default timeout for a single probe attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Trait for checking whether an address is reachable.
///
/// # Contract
///
/// - One attempt per call, bounded by the implementation's timeout
/// - Never errors and never panics: any transport-level failure (timeout,
///   no route, DNS failure) is reported as [`Reachability::Unreachable`]
/// - No side effects beyond issuing the network probe
///
/// # Example
///
/// ```ignore
/// use reachwatch::probe::Probe;
/// use reachwatch::target::Reachability;
///
/// struct AlwaysUp;
///
/// impl Probe for AlwaysUp {
///     async fn check(&self, _address: &str) -> Reachability {
///         Reachability::Reachable
///     }
/// }
/// ```
pub trait Probe: Send + Sync {
    /// Probes `address` once.
    fn check(&self, address: &str) -> impl std::future::Future<Output = Reachability> + Send;
}

/// Probe method selected by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredProbe {
    /// ICMP echo via the system `ping` program.
    Icmp(IcmpProbe),
    /// TCP connect.
    Tcp(TcpProbe),
}

impl Probe for ConfiguredProbe {
    async fn check(&self, address: &str) -> Reachability {
        match self {
            Self::Icmp(probe) => probe.check(address).await,
            Self::Tcp(probe) => probe.check(address).await,
        }
    }
}

/// Converts a probe attempt into a reachability reading, logging failures.
fn into_reachability(kind: &str, address: &str, result: Result<(), ProbeError>) -> Reachability {
    match result {
        Ok(()) => Reachability::Reachable,
        Err(e) => {
            tracing::debug!("{kind} probe of {address} failed: {e}");
            Reachability::Unreachable
        }
    }
}
