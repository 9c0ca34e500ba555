//! Two-level shutdown handle shared between the binary and monitor loops.

use tokio_util::sync::CancellationToken;

/// Cloneable stop/terminate handle.
///
/// - [`Shutdown::request_stop`] is graceful: loops stop before the next
///   target or during the inter-tick wait, and an in-flight confirmation
///   finishes and commits normally.
/// - [`Shutdown::terminate`] is immediate and implies a stop: an in-flight
///   probe or confirmation is abandoned without committing anything.
///
/// # Example
///
/// ```
/// use reachwatch::monitor::Shutdown;
///
/// let shutdown = Shutdown::new();
/// let handle = shutdown.clone();
///
/// handle.terminate();
/// assert!(shutdown.is_stop_requested());
/// assert!(shutdown.is_terminated());
/// ```
#[derive(Debug, Clone)]
pub struct Shutdown {
    stop: CancellationToken,
    terminate: CancellationToken,
}

impl Shutdown {
    /// Creates a handle with nothing requested yet.
    #[must_use]
    pub fn new() -> Self {
        let terminate = CancellationToken::new();
        Self {
            stop: terminate.child_token(),
            terminate,
        }
    }

    /// Asks every loop to stop after its in-flight target evaluation.
    ///
    /// A loop sitting in its inter-tick wait stops at once. Otherwise the
    /// worst case is one probe timeout for the tick plus a full
    /// confirmation window, `confirm_window` re-probes of up to
    /// 1 s + probe timeout each. Use [`Shutdown::terminate`] to cut that short.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Stops every loop immediately, abandoning in-flight confirmations.
    pub fn terminate(&self) {
        self.terminate.cancel();
    }

    /// Returns true once a stop or a termination has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Returns true once termination has been requested.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminate.is_cancelled()
    }

    /// Token cancelled on stop or termination.
    #[must_use]
    pub const fn stop_token(&self) -> &CancellationToken {
        &self.stop
    }

    /// Token cancelled on termination only.
    #[must_use]
    pub const fn terminate_token(&self) -> &CancellationToken {
        &self.terminate
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
