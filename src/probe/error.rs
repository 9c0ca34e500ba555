//! Error types for probe attempts.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Why a probe attempt did not succeed.
///
/// These errors never leave the probe layer: [`super::Probe::check`]
/// downgrades every variant to `Unreachable` after logging it.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No answer within the timeout.
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Hostname resolution failed or yielded no addresses.
    #[error("Failed to resolve address: {0}")]
    Resolve(#[source] io::Error),

    /// The TCP connection was refused or otherwise failed.
    #[error("Connection failed: {0}")]
    Connect(#[source] io::Error),

    /// The ping program could not be started.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The ping program ran but reported no reply.
    #[error("No reply (exit code {code:?})")]
    NoReply {
        /// Exit code of the ping program, if it exited normally
        code: Option<i32>,
    },

    /// The address cannot be probed safely (empty, or looks like a flag).
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}
