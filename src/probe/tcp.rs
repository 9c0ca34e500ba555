//! TCP connect probe.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::{TcpStream, lookup_host};

use super::{DEFAULT_TIMEOUT, Probe, ProbeError, into_reachability};
use crate::target::Reachability;

/// Probe that treats a completed TCP handshake as reachable.
///
/// A refused connection counts as unreachable: the probe answers "is this
/// service accepting connections", not merely "is the host alive".
#[derive(Debug, Clone)]
pub struct TcpProbe {
    default_port: u16,
    timeout: Duration,
}

impl TcpProbe {
    /// Port used when the target address does not name one.
    pub const DEFAULT_PORT: u16 = 80;

    /// Creates a probe for port 80 with a one-second timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default_port: Self::DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the port used for addresses without an explicit port.
    #[must_use]
    pub const fn with_default_port(mut self, port: u16) -> Self {
        self.default_port = port;
        self
    }

    /// Sets the connect timeout (covers resolution and handshake).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the default port.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        self.default_port
    }

    /// Returns the configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn try_check(&self, address: &str) -> Result<(), ProbeError> {
        let (host, port) = split_endpoint(address, self.default_port)?;

        tokio::time::timeout(self.timeout, connect_any(&host, port))
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))?
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for TcpProbe {
    async fn check(&self, address: &str) -> Reachability {
        into_reachability("TCP", address, self.try_check(address).await)
    }
}

/// Resolves `host` and connects to the first address that accepts.
async fn connect_any(host: &str, port: u16) -> Result<(), ProbeError> {
    let mut last_error = None;

    for addr in lookup_host((host, port)).await.map_err(ProbeError::Resolve)? {
        match TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.map_or_else(
        || {
            ProbeError::Resolve(io::Error::new(
                io::ErrorKind::NotFound,
                "no addresses returned",
            ))
        },
        ProbeError::Connect,
    ))
}

/// Splits an address into host and port.
///
/// Accepts `1.2.3.4`, `1.2.3.4:22`, `[::1]:22`, `::1`, `host`, `host:22`.
pub(super) fn split_endpoint(address: &str, default_port: u16) -> Result<(String, u16), ProbeError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ProbeError::InvalidAddress(address.to_string()));
    }

    if let Ok(socket) = address.parse::<SocketAddr>() {
        return Ok((socket.ip().to_string(), socket.port()));
    }

    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok((ip.to_string(), default_port));
    }

    if let Some((host, port)) = address.rsplit_once(':') {
        if host.contains(':') {
            return Err(ProbeError::InvalidAddress(address.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ProbeError::InvalidAddress(address.to_string()))?;
        return Ok((host.to_string(), port));
    }

    Ok((address.to_string(), default_port))
}
