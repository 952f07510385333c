//! Scenario: Query Failure Keeps State
//!
//! # Invariants under test
//! 1. A failed readings query changes nothing: observed state, battery and
//!    published attributes stay as they were.
//! 2. A malformed battery value skips only the battery update.
//! 3. `current_target` prefers the desired target, then a fresh observation,
//!    then the last observed state.

use std::sync::Arc;
use std::time::Duration;

use bolt_engine::{LockController, LockSettings};
use bolt_schemas::{BatteryStatus, LockState, TargetState};
use bolt_testkit::{FakeLockTransport, RecordingExposition};

fn rig(fake: FakeLockTransport) -> (LockController, Arc<FakeLockTransport>, Arc<RecordingExposition>) {
    let fake = Arc::new(fake);
    let rec = Arc::new(RecordingExposition::new());
    let settings = LockSettings::new("front-door", Duration::from_millis(1_000));
    let controller = LockController::new(settings, fake.clone(), rec.clone());
    (controller, fake, rec)
}

#[tokio::test(start_paused = true)]
async fn failed_query_leaves_everything_untouched() {
    let (controller, fake, rec) =
        rig(FakeLockTransport::new().with_lock_value("locked").with_battery("80"));

    assert_eq!(controller.poll_once().await, Some(LockState::Secured));
    let before = controller.snapshot().await;
    let events_before = rec.events();

    fake.set_fail_queries(true);
    fake.set_lock_value(Some("unlocked"));
    assert_eq!(controller.poll_once().await, None);

    let after = controller.snapshot().await;
    assert_eq!(after.observed, LockState::Secured);
    assert_eq!(after.battery, before.battery);
    assert_eq!(after.last_observed_at, before.last_observed_at);
    assert_eq!(after.stats.poll_failures, 1);
    assert_eq!(rec.events(), events_before);
}

#[tokio::test(start_paused = true)]
async fn battery_is_published_with_low_flag() {
    let (controller, fake, rec) =
        rig(FakeLockTransport::new().with_lock_value("locked").with_battery("21"));

    controller.poll_once().await;
    fake.set_battery(Some("20"));
    controller.poll_once().await;

    assert_eq!(
        rec.batteries(),
        vec![
            BatteryStatus { percent: 21, low: false },
            BatteryStatus { percent: 20, low: true },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_battery_skips_only_battery() {
    let (controller, fake, rec) =
        rig(FakeLockTransport::new().with_lock_value("locked").with_battery("64"));
    controller.poll_once().await;

    fake.set_battery(Some("sixty"));
    fake.set_locked(false);
    assert_eq!(controller.poll_once().await, Some(LockState::Unsecured));

    let snap = controller.snapshot().await;
    assert_eq!(snap.observed, LockState::Unsecured);
    assert_eq!(snap.battery, Some(BatteryStatus { percent: 64, low: false }));
    assert_eq!(snap.stats.malformed_readings, 1);
    assert_eq!(rec.batteries().len(), 1);
    assert_eq!(rec.last_current(), Some(LockState::Unsecured));
}

#[tokio::test(start_paused = true)]
async fn missing_battery_reading_publishes_nothing() {
    let (controller, _fake, rec) = rig(FakeLockTransport::new().with_lock_value("locked"));
    controller.poll_once().await;

    assert!(rec.batteries().is_empty());
    assert_eq!(controller.snapshot().await.battery, None);
}

#[tokio::test(start_paused = true)]
async fn current_target_prefers_desired_without_querying() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("unlocked"));

    controller.request_target(TargetState::Secured).await;
    let queries = fake.query_count();

    assert_eq!(controller.current_target().await, TargetState::Secured);
    assert_eq!(fake.query_count(), queries);
}

#[tokio::test(start_paused = true)]
async fn current_target_without_desired_queries_device() {
    let (controller, fake, rec) = rig(FakeLockTransport::new().with_lock_value("locked"));

    assert_eq!(controller.current_target().await, TargetState::Secured);
    assert_eq!(fake.query_count(), 1);
    // The on-demand read is a full observation.
    assert_eq!(rec.last_current(), Some(LockState::Secured));
    // Answering a query does not invent a desired target.
    assert_eq!(controller.snapshot().await.desired, None);
}

#[tokio::test(start_paused = true)]
async fn current_target_falls_back_to_last_observed() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("locked"));
    controller.poll_once().await;

    fake.set_fail_queries(true);
    assert_eq!(controller.current_target().await, TargetState::Secured);
}

#[tokio::test(start_paused = true)]
async fn current_target_with_nothing_observed_is_unsecured() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new());
    fake.set_fail_queries(true);

    assert_eq!(controller.current_target().await, TargetState::Unsecured);
}
