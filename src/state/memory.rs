//! In-memory status store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{StatusStore, StoreError};
use crate::target::Reachability;

/// Status store that lives only as long as the process.
///
/// Used when no state file is configured; every restart then begins with
/// all targets `Unknown`.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    statuses: RwLock<HashMap<(String, String), Reachability>>,
}

impl MemoryStatusStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `(group, address, status)` entries.
    #[must_use]
    pub fn with_statuses<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str, Reachability)>,
    ) -> Self {
        let statuses = entries
            .into_iter()
            .map(|(group, address, status)| ((group.to_string(), address.to_string()), status))
            .collect();
        Self {
            statuses: RwLock::new(statuses),
        }
    }

    /// Returns the stored status without going through the async trait.
    #[must_use]
    pub fn get(&self, group: &str, address: &str) -> Option<Reachability> {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(group.to_string(), address.to_string()))
            .copied()
    }

    /// Returns the number of stored statuses across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatusStore for MemoryStatusStore {
    async fn last_status(
        &self,
        address: &str,
        group: &str,
    ) -> Result<Option<Reachability>, StoreError> {
        Ok(self.get(group, address))
    }

    async fn set_status(
        &self,
        address: &str,
        group: &str,
        status: Reachability,
    ) -> Result<(), StoreError> {
        self.statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((group.to_string(), address.to_string()), status);
        Ok(())
    }

    async fn reset_statuses(&self, group: &str) -> Result<usize, StoreError> {
        let mut statuses = self
            .statuses
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = statuses.len();
        statuses.retain(|(g, _), _| g != group);
        Ok(before - statuses.len())
    }
}
