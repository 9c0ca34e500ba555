//! Shared test fixtures for monitor tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use super::MonitorContext;
use crate::alert::{AlertDispatcher, AlertFormatter, DispatchReport};
use crate::probe::Probe;
use crate::state::{MemoryStatusStore, StatusStore, StoreError};
use crate::target::{Reachability, Target};
use crate::time::Clock;

pub const UP: Reachability = Reachability::Reachable;
pub const DOWN: Reachability = Reachability::Unreachable;

pub const GROUP: &str = "office";

pub fn target(address: &str) -> Target {
    Target::new(address, GROUP)
}

/// Probe that replays a per-address script.
///
/// Once a script is exhausted its last value repeats. Addresses without a
/// script are unreachable. Every call is recorded with its (paused) time.
#[derive(Default)]
pub struct ScriptedProbe {
    scripts: Mutex<HashMap<String, VecDeque<Reachability>>>,
    last: Mutex<HashMap<String, Reachability>>,
    hanging: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, address: &str, readings: &[Reachability]) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(address.to_string(), readings.iter().copied().collect());
        self
    }

    /// Makes every probe of `address` from now on never complete.
    pub fn hang(&self, address: &str) {
        self.hanging.lock().unwrap().insert(address.to_string());
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, address: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == address)
            .count()
    }

    fn next(&self, address: &str) -> Reachability {
        let popped = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(address)
            .and_then(VecDeque::pop_front);
        let mut last = self.last.lock().unwrap();
        match popped {
            Some(reading) => {
                last.insert(address.to_string(), reading);
                reading
            }
            None => last.get(address).copied().unwrap_or(DOWN),
        }
    }
}

impl Probe for ScriptedProbe {
    async fn check(&self, address: &str) -> Reachability {
        self.calls
            .lock()
            .unwrap()
            .push((address.to_string(), Instant::now()));

        let hanging = self.hanging.lock().unwrap().contains(address);
        if hanging {
            std::future::pending::<()>().await;
        }
        self.next(address)
    }
}

/// In-memory store with switchable failures.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStatusStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str, Reachability)>,
    ) -> Self {
        Self {
            inner: MemoryStatusStore::with_statuses(entries),
            ..Self::default()
        }
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn get(&self, address: &str) -> Option<Reachability> {
        self.inner.get(GROUP, address)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn injected() -> StoreError {
        StoreError::Corrupted {
            reason: "injected failure".to_string(),
        }
    }
}

impl StatusStore for FlakyStore {
    async fn last_status(
        &self,
        address: &str,
        group: &str,
    ) -> Result<Option<Reachability>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.last_status(address, group).await
    }

    async fn set_status(
        &self,
        address: &str,
        group: &str,
        status: Reachability,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::injected());
        }
        self.inner.set_status(address, group, status).await
    }

    async fn reset_statuses(&self, group: &str) -> Result<usize, StoreError> {
        self.inner.reset_statuses(group).await
    }
}

/// One message handed to the [`RecordingDispatcher`].
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: String,
    pub recipients: Vec<String>,
    /// Stored status of the watched address at dispatch time.
    pub stored: Option<Reachability>,
}

/// Dispatcher that records messages instead of sending them.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    watch: Option<(Arc<FlakyStore>, String)>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the stored status of `address` with every delivery.
    pub fn watching(store: Arc<FlakyStore>, address: &str) -> Self {
        Self {
            deliveries: Arc::default(),
            watch: Some((store, address.to_string())),
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(&self, message: &str, recipients: &[String]) -> DispatchReport {
        let stored = self
            .watch
            .as_ref()
            .and_then(|(store, address)| store.get(address));
        self.deliveries.lock().unwrap().push(Delivery {
            message: message.to_string(),
            recipients: recipients.to_vec(),
            stored,
        });

        let mut report = DispatchReport::new();
        for recipient in recipients {
            report.record(recipient.as_str(), Ok(()));
        }
        report
    }
}

/// Clock frozen at a fixed instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 2024-03-09 10:00:00 UTC.
pub fn fixed_clock() -> FixedClock {
    FixedClock(DateTime::from_timestamp(1_709_978_400, 0).unwrap())
}

pub fn formatter() -> Arc<AlertFormatter> {
    let offset = crate::alert::parse_utc_offset("+02:00").unwrap();
    Arc::new(AlertFormatter::with_default_template(offset).unwrap())
}

pub fn context(
    probe: &Arc<ScriptedProbe>,
    store: &Arc<FlakyStore>,
    dispatcher: &RecordingDispatcher,
) -> MonitorContext<ScriptedProbe, FlakyStore, RecordingDispatcher, FixedClock> {
    MonitorContext::new(
        Arc::clone(probe),
        Arc::clone(store),
        dispatcher.clone(),
        formatter(),
        vec!["111".to_string(), "222".to_string()],
    )
    .with_clock(fixed_clock())
}
