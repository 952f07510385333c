//! Scenario: Auto-Lock Round Trip
//!
//! # Invariants under test
//! 1. An `UNSECURED` observation arms the relock timer when the delay is
//!    positive; a later `SECURED` (or `UNKNOWN`) observation cancels it and
//!    nothing is dispatched.
//! 2. Repeated `UNSECURED` observations keep the original deadline.
//! 3. On expiry the timer requests `SECURED` exactly like an external caller.
//! 4. A zero delay disables the policy.

use std::sync::Arc;
use std::time::Duration;

use bolt_engine::{LockController, LockSettings};
use bolt_schemas::{LockState, TargetState};
use bolt_testkit::{DispatchRecord, FakeLockTransport, RecordingExposition};

fn rig(
    fake: FakeLockTransport,
    auto_lock_minutes: u32,
) -> (LockController, Arc<FakeLockTransport>, Arc<RecordingExposition>) {
    let fake = Arc::new(fake);
    let rec = Arc::new(RecordingExposition::new());
    let settings = LockSettings::new("front-door", Duration::from_millis(1_000))
        .with_auto_lock_minutes(auto_lock_minutes);
    let controller = LockController::new(settings, fake.clone(), rec.clone());
    (controller, fake, rec)
}

#[tokio::test(start_paused = true)]
async fn secured_observation_cancels_pending_relock() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("unlocked"), 1);

    controller.poll_once().await;
    let snap = controller.snapshot().await;
    assert!(snap.auto_lock_armed);
    assert!(snap.invariants_hold());

    tokio::time::sleep(Duration::from_secs(30)).await;
    fake.set_locked(true);
    controller.poll_once().await;
    assert!(!controller.snapshot().await.auto_lock_armed);

    tokio::time::sleep(Duration::from_secs(60)).await;
    let snap = controller.snapshot().await;
    assert_eq!(snap.stats.auto_lock_fires, 0);
    assert_eq!(fake.dispatch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_observation_cancels_pending_relock() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("unlocked"), 1);

    controller.poll_once().await;
    fake.set_lock_value(None);
    assert_eq!(controller.poll_once().await, Some(LockState::Unknown));

    let snap = controller.snapshot().await;
    assert!(!snap.auto_lock_armed);
    assert!(snap.invariants_hold());
}

#[tokio::test(start_paused = true)]
async fn expiry_requests_secured_and_poll_confirms() {
    let (controller, fake, rec) =
        rig(FakeLockTransport::new().with_lock_value("unlocked").converging(), 1);

    controller.poll_once().await;
    tokio::time::sleep(Duration::from_secs(61)).await;

    assert_eq!(
        fake.dispatches(),
        vec![DispatchRecord {
            device_id: "front-door".to_string(),
            desired_locked: true,
            failed: false,
        }]
    );
    let snap = controller.snapshot().await;
    assert_eq!(snap.stats.auto_lock_fires, 1);
    assert!(snap.in_flight);
    assert!(!snap.auto_lock_armed);
    assert_eq!(rec.last_target(), Some(TargetState::Secured));

    assert_eq!(controller.poll_once().await, Some(LockState::Secured));
    let snap = controller.snapshot().await;
    assert!(!snap.in_flight);
    assert!(!snap.watchdog_armed);
    assert!(snap.invariants_hold());
}

#[tokio::test(start_paused = true)]
async fn repeated_unsecured_polls_keep_first_deadline() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("unlocked"), 1);

    controller.poll_once().await;
    tokio::time::sleep(Duration::from_secs(30)).await;
    controller.poll_once().await;

    // 61s after the first arm, 31s after the second poll.
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(fake.dispatch_count(), 1);
    assert_eq!(controller.snapshot().await.stats.auto_lock_fires, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_relock_is_not_fatal() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("unlocked"), 1);
    fake.set_fail_dispatch(true);

    controller.poll_once().await;
    tokio::time::sleep(Duration::from_secs(61)).await;

    let snap = controller.snapshot().await;
    assert_eq!(snap.stats.auto_lock_fires, 1);
    assert_eq!(snap.stats.dispatch_failures, 1);
    assert!(!snap.in_flight);
    assert_eq!(snap.desired, Some(TargetState::Unsecured));
    // Reconciliation observed UNSECURED again, so a fresh relock is pending.
    assert!(snap.auto_lock_armed);
    assert!(snap.invariants_hold());
}

#[tokio::test(start_paused = true)]
async fn zero_minutes_never_arms() {
    let (controller, fake, _rec) = rig(FakeLockTransport::new().with_lock_value("unlocked"), 0);

    controller.poll_once().await;
    assert!(!controller.snapshot().await.auto_lock_armed);

    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(fake.dispatch_count(), 0);
}
