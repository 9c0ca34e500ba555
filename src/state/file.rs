//! File-based status persistence implementation.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::{StatusStore, StoreError};
use crate::target::Reachability;

/// Current state file format version.
///
/// Increment this when making breaking changes to the format.
const STATE_FILE_VERSION: u32 = 1;

/// Statuses of one group, keyed by target address.
type GroupStatuses = BTreeMap<String, Reachability>;

/// On-disk state file format.
///
/// Incompatible versions are treated as corrupted and replaced on the
/// next write.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    /// Format version for future compatibility.
    version: u32,

    /// Unix timestamp when the state was saved. Not used in logic.
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_at: Option<String>,

    /// Statuses keyed by group, then by address.
    #[serde(default)]
    groups: BTreeMap<String, GroupStatuses>,
}

impl StateFile {
    fn empty() -> Self {
        Self {
            version: STATE_FILE_VERSION,
            saved_at: None,
            groups: BTreeMap::new(),
        }
    }
}

/// Result of reading the state file.
#[derive(Debug)]
enum LoadResult {
    Loaded(StateFile),
    NotFound,
    /// The file exists but could not be read; its content is unknown.
    Unreadable(std::io::Error),
    Corrupted { reason: String },
}

impl LoadResult {
    /// Classifies the outcome of reading the state file.
    fn from_read(read: std::io::Result<String>) -> Self {
        let content = match read {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Self::NotFound,
            Err(e) => return Self::Unreadable(e),
        };

        match serde_json::from_str::<StateFile>(&content) {
            Ok(state) if state.version != STATE_FILE_VERSION => Self::Corrupted {
                reason: format!(
                    "Incompatible version: expected {STATE_FILE_VERSION}, got {}",
                    state.version
                ),
            },
            Ok(state) => Self::Loaded(state),
            Err(e) => Self::Corrupted {
                reason: format!("Invalid JSON: {e}"),
            },
        }
    }

    /// Returns the state to modify and write back.
    ///
    /// Only a missing or unparsable file starts fresh. A read failure is an
    /// error, so the statuses of other groups are never overwritten blindly.
    fn into_updatable(self) -> Result<StateFile, StoreError> {
        match self {
            Self::Loaded(state) => Ok(state),
            Self::NotFound => Ok(StateFile::empty()),
            Self::Unreadable(e) => Err(StoreError::Read(e)),
            Self::Corrupted { reason } => {
                tracing::warn!("State file corrupted ({reason}), overwriting");
                Ok(StateFile::empty())
            }
        }
    }
}

/// Returns the current Unix timestamp as a string.
fn unix_timestamp_now() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", duration.as_secs())
}

/// File-based implementation of [`StatusStore`].
///
/// Every operation reads the whole file and, for writes, replaces it
/// using write-to-temp-then-rename:
/// 1. Write to `{path}.tmp`
/// 2. Rename `{path}.tmp` to `{path}`
///
/// File I/O runs on the blocking thread pool. Read-modify-write cycles
/// within one process are serialised by an internal lock, so concurrent
/// group tasks sharing a store do not lose each other's updates.
#[derive(Debug, Clone)]
pub struct FileStatusStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileStatusStore {
    /// Creates a new file-based status store at the given path.
    ///
    /// The file is created on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns the path to the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> LoadResult {
        LoadResult::from_read(std::fs::read_to_string(path))
    }

    fn save(path: &Path, state: &mut StateFile) -> Result<(), StoreError> {
        state.saved_at = Some(unix_timestamp_now());
        let content = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Write)?;
            }
        }

        // Append .tmp instead of replacing the extension (state.json -> state.json.tmp)
        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&temp_path, content).map_err(StoreError::Write)?;
        std::fs::rename(&temp_path, path).map_err(StoreError::Write)?;

        Ok(())
    }

    /// Runs `op` on the blocking pool while holding the store lock.
    async fn with_file<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock = Arc::clone(&self.lock);

        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            op(&path)
        })
        .await
        .map_err(StoreError::Task)?
    }
}

impl StatusStore for FileStatusStore {
    async fn last_status(
        &self,
        address: &str,
        group: &str,
    ) -> Result<Option<Reachability>, StoreError> {
        let address = address.to_string();
        let group = group.to_string();

        self.with_file(move |path| match Self::load(path) {
            LoadResult::Loaded(state) => Ok(state
                .groups
                .get(&group)
                .and_then(|statuses| statuses.get(&address))
                .copied()),
            LoadResult::NotFound => Ok(None),
            LoadResult::Unreadable(e) => Err(StoreError::Read(e)),
            LoadResult::Corrupted { reason } => Err(StoreError::Corrupted { reason }),
        })
        .await
    }

    async fn set_status(
        &self,
        address: &str,
        group: &str,
        status: Reachability,
    ) -> Result<(), StoreError> {
        let address = address.to_string();
        let group = group.to_string();

        self.with_file(move |path| {
            let mut state = Self::load(path).into_updatable()?;
            state.groups.entry(group).or_default().insert(address, status);
            Self::save(path, &mut state)
        })
        .await
    }

    async fn reset_statuses(&self, group: &str) -> Result<usize, StoreError> {
        let group = group.to_string();

        self.with_file(move |path| {
            let mut state = match Self::load(path) {
                LoadResult::Loaded(state) => state,
                LoadResult::NotFound => return Ok(0),
                LoadResult::Unreadable(e) => return Err(StoreError::Read(e)),
                LoadResult::Corrupted { reason } => return Err(StoreError::Corrupted { reason }),
            };

            let removed = state.groups.remove(&group).map_or(0, |s| s.len());
            if removed > 0 {
                Self::save(path, &mut state)?;
            }
            Ok(removed)
        })
        .await
    }
}
