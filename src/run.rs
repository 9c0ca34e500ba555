//! Application execution logic.
//!
//! This module wires the validated configuration into one monitor loop
//! per group and maps process signals onto the shared shutdown handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::signal;
use tokio::task::JoinSet;

use reachwatch::alert::{AlertFormatter, AlertTemplateError, ReqwestClient, TelegramDispatcher};
use reachwatch::config::{GroupConfig, ValidatedConfig};
use reachwatch::monitor::{GroupSettings, MonitorContext, MonitorLoop, Shutdown};
use reachwatch::probe::ConfiguredProbe;
use reachwatch::state::{FileStatusStore, MemoryStatusStore, StatusStore, StoreError};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to build the HTTP client.
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The alert template was rejected.
    #[error("Invalid alert template: {0}")]
    Template(#[from] AlertTemplateError),

    /// A monitor task panicked or was cancelled.
    #[error("Monitor task failed: {0}")]
    Task(#[source] tokio::task::JoinError),

    /// `reset` was requested but no state file is configured.
    #[error("No state file configured; set monitor.state_file or pass --state-file")]
    NoStateFile,

    /// Failed to clear stored statuses.
    #[error("Failed to reset stored statuses: {0}")]
    Reset(#[source] StoreError),
}

/// Runtime options extracted from validated config.
///
/// Holds the settings shared by every group's dispatcher and the store
/// choice, so the group list can be borrowed separately.
struct RuntimeOptions {
    api_base: url::Url,
    dry_run: bool,
    state_file: Option<PathBuf>,
}

impl From<&ValidatedConfig> for RuntimeOptions {
    fn from(config: &ValidatedConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            dry_run: config.dry_run,
            state_file: config.state_file.clone(),
        }
    }
}

/// Shared collaborators handed to every group's loop.
struct SharedParts {
    probe: Arc<ConfiguredProbe>,
    formatter: Arc<AlertFormatter>,
    client: ReqwestClient,
}

/// Executes the monitoring session.
///
/// This function:
/// 1. Builds the probe, alert formatter, and HTTP client shared by all groups
/// 2. Opens the status store (file-backed if configured, in-memory otherwise)
/// 3. Spawns one monitor loop per selected group
/// 4. Runs until every loop has stopped
///
/// The first Ctrl+C asks the loops to stop gracefully; a second Ctrl+C or
/// SIGTERM terminates them immediately.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP client cannot be created
/// - The alert template is invalid
/// - A monitor task panicked
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires
/// a real async runtime with signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let options = RuntimeOptions::from(&config);

    let client = ReqwestClient::with_timeout(ReqwestClient::DEFAULT_TIMEOUT)
        .map_err(RunError::HttpClient)?;
    let parts = SharedParts {
        probe: Arc::new(config.probe.build()),
        formatter: Arc::new(AlertFormatter::new(&config.template, config.utc_offset)?),
        client,
    };

    if options.dry_run {
        tracing::info!("Dry-run mode enabled - alerts will be logged but not sent");
    }

    let shutdown = Shutdown::new();
    let signals = tokio::spawn(watch_signals(shutdown.clone()));

    let result = if let Some(ref path) = options.state_file {
        tracing::info!("State persistence enabled: {}", path.display());
        let store = Arc::new(FileStatusStore::new(path));
        run_groups(&config.groups, &options, &parts, store, &shutdown).await
    } else {
        tracing::info!("No state file configured, statuses are kept in memory");
        let store = Arc::new(MemoryStatusStore::new());
        run_groups(&config.groups, &options, &parts, store, &shutdown).await
    };

    signals.abort();
    result
}

/// Spawns a loop per group and waits for all of them.
async fn run_groups<S>(
    groups: &[GroupConfig],
    options: &RuntimeOptions,
    parts: &SharedParts,
    store: Arc<S>,
    shutdown: &Shutdown,
) -> Result<(), RunError>
where
    S: StatusStore + 'static,
{
    let mut tasks = JoinSet::new();

    for group in groups {
        let dispatcher = create_dispatcher(group, parts.client.clone(), options);
        let context = MonitorContext::new(
            Arc::clone(&parts.probe),
            Arc::clone(&store),
            dispatcher,
            Arc::clone(&parts.formatter),
            group.recipients.clone(),
        );
        let monitor = MonitorLoop::new(GroupSettings::from(group), context);
        tasks.spawn(monitor.run(shutdown.clone()));
    }

    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(summary) => {
                tracing::debug!(
                    "Monitor loop finished: {} cycle(s), {} alert(s)",
                    summary.cycles,
                    summary.alerts
                );
            }
            Err(e) => {
                tracing::error!("Monitor task failed: {e}");
                shutdown.request_stop();
                failure.get_or_insert(RunError::Task(e));
            }
        }
    }

    failure.map_or(Ok(()), Err)
}

/// Creates the Telegram dispatcher for one group.
fn create_dispatcher(
    group: &GroupConfig,
    client: ReqwestClient,
    options: &RuntimeOptions,
) -> TelegramDispatcher<ReqwestClient> {
    // Validation guarantees a token unless dry-run is on
    let token = group.bot_token.clone().unwrap_or_default();

    TelegramDispatcher::new(client, token)
        .with_api_base(options.api_base.clone())
        .with_dry_run(options.dry_run)
}

/// Clears the stored statuses of `group` in the state file at `state_file`.
///
/// # Errors
///
/// Returns an error if no state file is configured or it cannot be updated.
pub async fn reset(state_file: Option<&Path>, group: &str) -> Result<usize, RunError> {
    let path = state_file.ok_or(RunError::NoStateFile)?;
    let store = FileStatusStore::new(path);

    let cleared = store
        .reset_statuses(group)
        .await
        .map_err(RunError::Reset)?;
    tracing::info!(
        "Cleared {cleared} stored status(es) of group {group} in {}",
        path.display()
    );
    Ok(cleared)
}

/// Maps process signals onto `shutdown`.
///
/// First Ctrl+C: graceful stop. Second Ctrl+C or SIGTERM: terminate.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn watch_signals(shutdown: Shutdown) {
    let terminate = terminate_signal();
    tokio::pin!(terminate);

    tokio::select! {
        biased;

        () = &mut terminate => {
            tracing::info!("Termination signal received, stopping now...");
            shutdown.terminate();
            return;
        }

        () = ctrl_c() => {}
    }

    tracing::info!("Shutdown signal received, finishing in-flight checks (Ctrl+C again to stop now)...");
    shutdown.request_stop();

    tokio::select! {
        () = &mut terminate => {}
        () = ctrl_c() => {}
    }

    tracing::info!("Second signal received, stopping now...");
    shutdown.terminate();
}

/// Completes on Ctrl+C, or never if the handler cannot be installed.
#[cfg(not(tarpaulin_include))]
async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Completes on SIGTERM (unix only).
#[cfg(not(tarpaulin_include))]
async fn terminate_signal() {
    #[cfg(unix)]
    let listen = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let listen = std::future::pending::<()>();

    listen.await;
}
