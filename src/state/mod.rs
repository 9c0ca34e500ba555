//! Status persistence for resuming monitoring across restarts.
//!
//! This module provides the [`StatusStore`] abstraction over the durable
//! `(target, group) -> last confirmed status` mapping, with a JSON file
//! implementation ([`FileStatusStore`]) and an in-memory one
//! ([`MemoryStatusStore`]) for runs without a state file.

mod file;
mod memory;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;

use std::io;

use thiserror::Error;

use crate::target::Reachability;

/// Errors that can occur during status persistence operations.
///
/// The monitor loop never treats these as fatal: it logs them and keeps
/// going with its in-memory cache.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the state file.
    #[error("Failed to read state file: {0}")]
    Read(#[source] io::Error),

    /// Failed to write the state file.
    #[error("Failed to write state file: {0}")]
    Write(#[source] io::Error),

    /// Failed to serialize state to JSON.
    #[error("Failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The state file exists but cannot be used.
    ///
    /// The next write replaces it with a fresh file.
    #[error("State file is corrupted: {reason}")]
    Corrupted {
        /// Reason for corruption (for logging/debugging).
        reason: String,
    },

    /// The blocking I/O task did not complete.
    #[error("State I/O task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
}

/// Abstraction over the durable last-known-status mapping.
///
/// Keys are `(group, target address)`. Writes are plain upserts with
/// last-writer-wins semantics; no transaction spans more than one key.
///
/// # Testing
///
/// Use [`MemoryStatusStore`] in tests to avoid filesystem dependencies.
pub trait StatusStore: Send + Sync {
    /// Returns the last confirmed status of `address` in `group`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn last_status(
        &self,
        address: &str,
        group: &str,
    ) -> impl std::future::Future<Output = Result<Option<Reachability>, StoreError>> + Send;

    /// Records `status` for `address` in `group`.
    ///
    /// Idempotent: writing the same status twice leaves the same stored state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set_status(
        &self,
        address: &str,
        group: &str,
        status: Reachability,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Clears every stored status of `group`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or written.
    fn reset_statuses(
        &self,
        group: &str,
    ) -> impl std::future::Future<Output = Result<usize, StoreError>> + Send;
}
