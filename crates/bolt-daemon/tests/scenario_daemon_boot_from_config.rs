//! Scenario: Daemon boots one controller per configured lock
//!
//! # Invariants under test
//! 1. Every `locks[]` entry becomes an independent controller keyed by
//!    device id, named by `name` (falling back to the device id).
//! 2. Controllers built from config poll on their own interval.
//! 3. Locks share no state: a request on one never touches another.

use std::sync::Arc;
use std::time::Duration;

use bolt_config::{load_layered_yaml_from_strings, BridgeConfig};
use bolt_daemon::state::AppState;
use bolt_engine::LockSettings;
use bolt_schemas::{LockState, TargetState};
use bolt_testkit::FakeLockTransport;

const CONFIG: &str = r#"
transport:
  base_url: "http://lock-hub.local"
locks:
  - device_id: "front-door"
    name: "Front Door"
    poll_interval_ms: 1000
  - device_id: "back-door"
    poll_interval_ms: 2000
    auto_lock_minutes: 5
"#;

fn config() -> BridgeConfig {
    let loaded = load_layered_yaml_from_strings(&[CONFIG]).unwrap();
    BridgeConfig::from_loaded(&loaded).unwrap()
}

#[tokio::test(start_paused = true)]
async fn each_lock_gets_a_polling_controller() {
    let fake = Arc::new(FakeLockTransport::new().with_lock_value("locked"));
    let st = AppState::spawn_from_config(&config(), fake.clone()).unwrap();

    assert_eq!(st.locks.len(), 2);
    let front = st.lock("front-door").unwrap();
    let back = st.lock("back-door").unwrap();
    assert_eq!(front.accessory.snapshot().name, "Front Door");
    assert_eq!(back.accessory.snapshot().name, "back-door");
    assert_eq!(
        back.controller.settings().auto_lock_delay,
        Some(Duration::from_secs(300))
    );

    // Immediate first poll on both, then front polls again at t=1000.
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(front.accessory.snapshot().current_state, LockState::Secured);
    assert_eq!(back.accessory.snapshot().current_state, LockState::Secured);
    assert_eq!(front.controller.snapshot().await.stats.observations, 2);
    assert_eq!(back.controller.snapshot().await.stats.observations, 1);
}

#[tokio::test(start_paused = true)]
async fn locks_are_independent() {
    let front_fake = Arc::new(FakeLockTransport::new().with_lock_value("locked"));
    let back_fake = Arc::new(FakeLockTransport::new().with_lock_value("locked"));

    let mut st = AppState::new();
    st.add_lock(
        "Front Door",
        LockSettings::new("front-door", Duration::from_secs(1)),
        front_fake.clone(),
        false,
    )
    .unwrap();
    st.add_lock(
        "Back Door",
        LockSettings::new("back-door", Duration::from_secs(1)),
        back_fake.clone(),
        false,
    )
    .unwrap();

    let front = st.lock("front-door").unwrap();
    front.controller.request_target(TargetState::Unsecured).await;

    let back = st.lock("back-door").unwrap();
    let back_snap = back.controller.snapshot().await;
    assert!(!back_snap.in_flight);
    assert_eq!(back_snap.desired, None);
    assert_eq!(back.accessory.snapshot().target_state, None);
    assert_eq!(back_fake.dispatch_count(), 0);
    assert_eq!(front_fake.dispatch_count(), 1);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let fake = Arc::new(FakeLockTransport::new());
    let mut st = AppState::new();
    let settings = LockSettings::new("front-door", Duration::from_secs(1));

    st.add_lock("Front Door", settings.clone(), fake.clone(), false)
        .unwrap();
    let err = st
        .add_lock("Front Door", settings, fake.clone(), false)
        .unwrap_err();
    assert!(err.to_string().contains("registered twice"));
}
