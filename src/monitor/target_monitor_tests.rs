//! Tests for `TargetMonitor`: seeding, first observation, confirmation and commit.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::test_fixtures::{
    DOWN, FlakyStore, GROUP, RecordingDispatcher, ScriptedProbe, UP, context, target,
};
use super::{TargetMonitor, TickOutcome};
use crate::target::TargetStatus;

const ADDR: &str = "192.168.1.1";

fn monitor(window: u32) -> TargetMonitor {
    TargetMonitor::new(GROUP, vec![target(ADDR)], window)
}

mod seeding {
    use super::*;

    #[tokio::test]
    async fn stored_statuses_are_loaded() {
        let store = FlakyStore::with_statuses([(GROUP, ADDR, DOWN)]);
        let mut monitor = TargetMonitor::new(GROUP, vec![target(ADDR), target("10.0.0.9")], 3);

        let resumed = monitor.seed(&store).await;

        assert_eq!(resumed, 1);
        assert_eq!(monitor.status(ADDR), TargetStatus::Unreachable);
        assert_eq!(monitor.status("10.0.0.9"), TargetStatus::Unknown);
    }

    #[tokio::test]
    async fn statuses_of_other_groups_are_ignored() {
        let store = FlakyStore::with_statuses([("warehouse", ADDR, DOWN)]);
        let mut monitor = monitor(3);

        assert_eq!(monitor.seed(&store).await, 0);
        assert_eq!(monitor.status(ADDR), TargetStatus::Unknown);
    }

    #[tokio::test]
    async fn read_failure_seeds_unknown() {
        let store = FlakyStore::with_statuses([(GROUP, ADDR, DOWN)]).failing_reads();
        let mut monitor = monitor(3);

        let resumed = monitor.seed(&store).await;

        assert_eq!(resumed, 0);
        assert_eq!(monitor.status(ADDR), TargetStatus::Unknown);
    }

    #[test]
    fn new_monitor_has_every_target_unknown() {
        let monitor = TargetMonitor::new(GROUP, vec![target("a"), target("b")], 1);

        assert_eq!(monitor.status("a"), TargetStatus::Unknown);
        assert_eq!(monitor.status("b"), TargetStatus::Unknown);
        assert_eq!(monitor.targets().len(), 2);
        assert_eq!(monitor.group(), GROUP);
        assert_eq!(monitor.confirm_window(), 1);
    }
}

mod scenarios {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_observation_is_recorded_silently() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[UP]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(3);
        monitor.seed(store.as_ref()).await;

        let outcome = monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(outcome, TickOutcome::Initialized(UP));
        assert_eq!(monitor.status(ADDR), TargetStatus::Reachable);
        assert_eq!(store.get(ADDR), Some(UP));
        assert!(dispatcher.deliveries().is_empty());
        assert_eq!(probe.call_count(ADDR), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stable_loss_is_confirmed_and_announced() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN, DOWN, DOWN, DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, UP)]));
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(3);
        monitor.seed(store.as_ref()).await;
        let start = Instant::now();

        let outcome = monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(outcome, TickOutcome::Confirmed { from: UP, to: DOWN });
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(3));
        assert_eq!(probe.call_count(ADDR), 4);
        assert_eq!(monitor.status(ADDR), TargetStatus::Unreachable);
        assert_eq!(store.get(ADDR), Some(DOWN));

        let deliveries = dispatcher.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].message.contains("connection lost"));
        assert_eq!(deliveries[0].recipients, vec!["111", "222"]);
    }

    #[tokio::test(start_paused = true)]
    async fn flap_is_discarded() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN, DOWN, UP, DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, UP)]));
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(3);
        monitor.seed(store.as_ref()).await;

        let outcome = monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(outcome, TickOutcome::Reverted { second: 2 });
        assert_eq!(probe.call_count(ADDR), 3);
        assert_eq!(monitor.status(ADDR), TargetStatus::Reachable);
        assert_eq!(store.get(ADDR), Some(UP));
        assert_eq!(store.write_count(), 0);
        assert!(dispatcher.deliveries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_window_confirms_immediately() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[UP]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, DOWN)]));
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(0);
        monitor.seed(store.as_ref()).await;
        let start = Instant::now();

        let outcome = monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(outcome, TickOutcome::Confirmed { from: DOWN, to: UP });
        assert_eq!(Instant::now(), start);
        assert_eq!(probe.call_count(ADDR), 1);
        assert_eq!(store.get(ADDR), Some(UP));

        let deliveries = dispatcher.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].message.contains("connection restored"));
    }
}

mod commit {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn restart_resumes_under_the_monitor_group() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        // Target built for another group than the monitor it runs in
        let foreign = crate::target::Target::new(ADDR, "warehouse");
        let mut first = TargetMonitor::new(GROUP, vec![foreign.clone()], 0);
        first.seed(store.as_ref()).await;

        first.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(store.get(ADDR), Some(DOWN));
        let mut restarted = TargetMonitor::new(GROUP, vec![foreign], 0);
        let resumed = restarted.seed(store.as_ref()).await;
        assert_eq!(resumed, 1);
        assert_eq!(restarted.status(ADDR), TargetStatus::Unreachable);
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_persisted_before_dispatch() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, UP)]));
        let dispatcher = RecordingDispatcher::watching(Arc::clone(&store), ADDR);
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(2);
        monitor.seed(store.as_ref()).await;

        monitor.tick(0, &ctx, &CancellationToken::new()).await;

        let deliveries = dispatcher.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].stored, Some(DOWN));
    }

    #[tokio::test(start_paused = true)]
    async fn message_uses_default_layout_and_offset() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, UP)]));
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = TargetMonitor::new(
            GROUP,
            vec![target(ADDR).with_display_name(Some("Router"))],
            1,
        );
        monitor.seed(store.as_ref()).await;

        monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(
            dispatcher.deliveries()[0].message,
            "Router: [ 192.168.1.1 ]\nDate: [ 09.03.2024 12:00:00 ]\nObject: [ office ]\nStatus: connection lost! ⛔"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn seeded_status_is_never_announced() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, DOWN)]));
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(3);
        monitor.seed(store.as_ref()).await;

        let outcome = monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(outcome, TickOutcome::Steady(DOWN));
        assert!(dispatcher.deliveries().is_empty());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn write_failure_still_announces_and_advances_cache() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[UP]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, DOWN)]).failing_writes());
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(1);
        monitor.seed(store.as_ref()).await;

        let outcome = monitor.tick(0, &ctx, &CancellationToken::new()).await;

        assert_eq!(outcome, TickOutcome::Confirmed { from: DOWN, to: UP });
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get(ADDR), Some(DOWN));
        assert_eq!(monitor.status(ADDR), TargetStatus::Reachable);
        assert_eq!(dispatcher.deliveries().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn terminate_mid_confirmation_commits_nothing() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[DOWN]));
        let store = Arc::new(FlakyStore::with_statuses([(GROUP, ADDR, UP)]));
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(5);
        monitor.seed(store.as_ref()).await;

        let terminate = CancellationToken::new();
        let trigger = terminate.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let outcome = monitor.tick(0, &ctx, &terminate).await;

        assert_eq!(outcome, TickOutcome::Abandoned);
        assert_eq!(monitor.status(ADDR), TargetStatus::Reachable);
        assert_eq!(store.get(ADDR), Some(UP));
        assert_eq!(store.write_count(), 0);
        assert!(dispatcher.deliveries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn terminated_before_probe_does_nothing() {
        let probe = Arc::new(ScriptedProbe::new().script(ADDR, &[UP]));
        let store = Arc::new(FlakyStore::new());
        let dispatcher = RecordingDispatcher::new();
        let ctx = context(&probe, &store, &dispatcher);
        let mut monitor = monitor(1);
        let terminate = CancellationToken::new();
        terminate.cancel();

        let outcome = monitor.tick(0, &ctx, &terminate).await;

        assert_eq!(outcome, TickOutcome::Abandoned);
        assert_eq!(monitor.status(ADDR), TargetStatus::Unknown);
        assert_eq!(store.write_count(), 0);
    }
}
