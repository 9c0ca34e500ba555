//! Tests for `MonitorLoop`: cycles, isolation and shutdown behavior.

use std::sync::Arc;
use std::time::Duration;

use super::test_fixtures::{
    DOWN, FixedClock, FlakyStore, GROUP, RecordingDispatcher, ScriptedProbe, UP, context, target,
};
use super::{GroupSettings, LoopSummary, MonitorLoop, Shutdown, TickOutcome};
use crate::target::TargetStatus;

type TestLoop = MonitorLoop<ScriptedProbe, FlakyStore, RecordingDispatcher, FixedClock>;

fn settings(addresses: &[&str], interval_secs: u64, window: u32) -> GroupSettings {
    GroupSettings::new(GROUP, addresses.iter().map(|a| target(a)).collect())
        .with_interval(Duration::from_secs(interval_secs))
        .with_confirm_window(window)
}

fn after(delay: Duration, action: impl FnOnce() + Send + 'static) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        action();
    });
}

mod cycles {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn targets_are_evaluated_in_order() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[UP]).script("b", &[DOWN]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let mut monitor: TestLoop = MonitorLoop::new(
            settings(&["a", "b", "c"], 10, 3),
            context(&probe, &store, &dispatcher),
        );
        monitor.seed().await;

        let outcomes = monitor.run_cycle(&Shutdown::new()).await;

        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Initialized(UP),
                TickOutcome::Initialized(DOWN),
                TickOutcome::Initialized(DOWN),
            ]
        );
        let order: Vec<String> = probe.calls().into_iter().map(|(a, _)| a).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_target_does_not_affect_another() {
        let probe = Arc::new(
            ScriptedProbe::new()
                .script("a", &[DOWN, UP])
                .script("b", &[DOWN, DOWN]),
        );
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, "a", UP), (GROUP, "b", UP)]));
        let dispatcher = RecordingDispatcher::new();
        let mut monitor: TestLoop = MonitorLoop::new(
            settings(&["a", "b"], 10, 1),
            context(&probe, &store, &dispatcher),
        );
        monitor.seed().await;

        let outcomes = monitor.run_cycle(&Shutdown::new()).await;

        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Reverted { second: 1 },
                TickOutcome::Confirmed { from: UP, to: DOWN },
            ]
        );
        assert_eq!(monitor.monitor().status("a"), TargetStatus::Reachable);
        assert_eq!(monitor.monitor().status("b"), TargetStatus::Unreachable);
        assert_eq!(dispatcher.deliveries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_request_skips_remaining_targets() {
        let probe = Arc::new(ScriptedProbe::new());
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let mut monitor: TestLoop = MonitorLoop::new(
            settings(&["a", "b"], 10, 1),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        shutdown.request_stop();

        let outcomes = monitor.run_cycle(&shutdown).await;

        assert!(outcomes.is_empty());
        assert!(probe.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn loop_repeats_every_interval_until_stopped() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[UP]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a"], 10, 3),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        after(Duration::from_secs(25), move || handle.request_stop());

        let summary = monitor.run(shutdown).await;

        assert_eq!(
            summary,
            LoopSummary {
                cycles: 3,
                alerts: 0
            }
        );
        assert_eq!(probe.call_count("a"), 3);
        assert!(dispatcher.deliveries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn store_failures_do_not_stop_the_loop() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[UP, UP, DOWN]));
        let store = Arc::new(FlakyStore::new().failing_reads().failing_writes());
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a"], 10, 0),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        after(Duration::from_secs(35), move || handle.request_stop());

        let summary = monitor.run(shutdown).await;

        assert_eq!(summary.cycles, 4);
        assert_eq!(summary.alerts, 1);
        assert_eq!(dispatcher.deliveries().len(), 1);
        assert_eq!(store.write_count(), 2);
    }
}

mod shutdown {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn graceful_stop_finishes_in_flight_confirmation() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, "a", UP)]));
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a", "b"], 10, 5),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        after(Duration::from_millis(2500), move || handle.request_stop());

        let summary = monitor.run(shutdown).await;

        assert_eq!(summary.alerts, 1);
        assert_eq!(summary.cycles, 0);
        assert_eq!(store.get("a"), Some(DOWN));
        assert_eq!(dispatcher.deliveries().len(), 1);
        assert_eq!(probe.call_count("b"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_stop_waits_out_the_confirmation_window() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, "a", UP)]));
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a"], 10, 5),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        after(Duration::from_millis(500), move || handle.request_stop());
        let started = tokio::time::Instant::now();

        monitor.run(shutdown).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(6), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn terminate_abandons_in_flight_confirmation() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, "a", UP)]));
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a"], 10, 5),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        after(Duration::from_millis(2500), move || handle.terminate());

        let summary = monitor.run(shutdown).await;

        assert_eq!(summary.alerts, 0);
        assert_eq!(store.get("a"), Some(UP));
        assert_eq!(store.write_count(), 0);
        assert!(dispatcher.deliveries().is_empty());
        assert_eq!(probe.call_count("a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_wait_ends_promptly() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[UP]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a"], 3600, 1),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();
        let handle = shutdown.clone();
        after(Duration::from_secs(5), move || handle.request_stop());
        let start = tokio::time::Instant::now();

        let summary = monitor.run(shutdown).await;

        assert_eq!(summary.cycles, 1);
        assert_eq!(
            tokio::time::Instant::now().duration_since(start),
            Duration::from_secs(5)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn runs_as_a_spawned_task() {
        let probe = Arc::new(ScriptedProbe::new().script("a", &[UP]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let monitor: TestLoop = MonitorLoop::new(
            settings(&["a"], 10, 1),
            context(&probe, &store, &dispatcher),
        );
        let shutdown = Shutdown::new();

        let task = tokio::spawn(monitor.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_secs(15)).await;
        shutdown.request_stop();
        let summary = task.await.unwrap();

        assert_eq!(summary.cycles, 2);
        assert_eq!(store.get("a"), Some(UP));
    }
}
