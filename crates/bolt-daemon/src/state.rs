//! Shared runtime state for bolt-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Each configured lock
//! gets one [`AccessoryState`] (the home-automation view, fed by the engine
//! through [`LockExposition`]) and one [`LockController`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use bolt_config::BridgeConfig;
use bolt_engine::{LockController, LockExposition, LockSettings};
use bolt_schemas::{BatteryStatus, LockState, TargetState};
use bolt_transport::LockTransport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

// ---------------------------------------------------------------------------
// BusMsg — SSE event bus payload
// ---------------------------------------------------------------------------

/// Messages broadcast over the internal event bus and surfaced as SSE events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMsg {
    Heartbeat { ts_millis: i64 },
    Accessory(AccessorySnapshot),
    LogLine { level: String, msg: String },
}

impl BusMsg {
    /// SSE `event:` field for this message.
    pub fn event_name(&self) -> &'static str {
        match self {
            BusMsg::Heartbeat { .. } => "heartbeat",
            BusMsg::Accessory(_) => "accessory",
            BusMsg::LogLine { .. } => "log",
        }
    }
}

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// AccessorySnapshot / AccessoryState
// ---------------------------------------------------------------------------

/// The attributes a home-automation controller sees for one lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorySnapshot {
    pub device_id: String,
    pub name: String,
    pub current_state: LockState,
    /// `None` until the first request or reconciliation.
    pub target_state: Option<TargetState>,
    pub battery_percent: Option<u8>,
    pub battery_low: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Attribute store for one lock. Implements the engine's exposition port;
/// every change is also broadcast on the bus.
pub struct AccessoryState {
    bus: broadcast::Sender<BusMsg>,
    attrs: watch::Sender<AccessorySnapshot>,
}

impl AccessoryState {
    pub fn new(device_id: &str, name: &str, bus: broadcast::Sender<BusMsg>) -> Self {
        let (attrs, _rx) = watch::channel(AccessorySnapshot {
            device_id: device_id.to_string(),
            name: name.to_string(),
            current_state: LockState::Unknown,
            target_state: None,
            battery_percent: None,
            battery_low: None,
            updated_at: None,
        });
        Self { bus, attrs }
    }

    pub fn snapshot(&self) -> AccessorySnapshot {
        self.attrs.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut AccessorySnapshot)) {
        self.attrs.send_modify(|snap| {
            f(snap);
            snap.updated_at = Some(Utc::now());
        });
        let _ = self.bus.send(BusMsg::Accessory(self.snapshot()));
    }
}

impl LockExposition for AccessoryState {
    fn publish_current_state(&self, state: LockState) {
        self.update(|snap| snap.current_state = state);
    }

    fn publish_target_state(&self, target: TargetState) {
        self.update(|snap| snap.target_state = Some(target));
        let device_id = self.attrs.borrow().device_id.clone();
        let _ = self.bus.send(BusMsg::LogLine {
            level: "INFO".to_string(),
            msg: format!("{device_id} target -> {target}"),
        });
    }

    fn publish_battery(&self, battery: BatteryStatus) {
        self.update(|snap| {
            snap.battery_percent = Some(battery.percent);
            snap.battery_low = Some(battery.low);
        });
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// One lock as hosted by the daemon.
#[derive(Clone)]
pub struct LockEntry {
    pub accessory: Arc<AccessoryState>,
    pub controller: LockController,
}

/// Shared across all Axum handlers via `Arc`.
pub struct AppState {
    /// Broadcast bus for SSE.
    pub bus: broadcast::Sender<BusMsg>,
    pub build: BuildInfo,
    /// Keyed by device id. Fixed after startup.
    pub locks: BTreeMap<String, LockEntry>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Empty state with no locks.
    pub fn new() -> Self {
        let (bus, _rx) = broadcast::channel::<BusMsg>(1024);
        Self {
            bus,
            build: BuildInfo {
                service: "bolt-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            locks: BTreeMap::new(),
        }
    }

    /// One polling controller per configured lock, all sharing `transport`.
    /// Must be called from inside a tokio runtime.
    pub fn spawn_from_config(cfg: &BridgeConfig, transport: Arc<dyn LockTransport>) -> Result<Self> {
        let mut state = Self::new();
        for entry in &cfg.locks {
            let settings = LockSettings::new(
                entry.device_id.clone(),
                Duration::from_millis(entry.poll_interval_ms),
            )
            .with_auto_lock_minutes(entry.auto_lock_minutes);
            state.add_lock(entry.display_name(), settings, Arc::clone(&transport), true)?;
        }
        Ok(state)
    }

    /// Register a lock. `start_poller = false` leaves observation to
    /// on-demand reads (used by tests).
    pub fn add_lock(
        &mut self,
        name: &str,
        settings: LockSettings,
        transport: Arc<dyn LockTransport>,
        start_poller: bool,
    ) -> Result<LockController> {
        let device_id = settings.device_id.clone();
        if self.locks.contains_key(&device_id) {
            bail!("CONFIG_INVALID: lock '{device_id}' registered twice");
        }

        let accessory = Arc::new(AccessoryState::new(&device_id, name, self.bus.clone()));
        let exposition: Arc<dyn LockExposition> = accessory.clone();
        let controller = if start_poller {
            LockController::spawn(settings, transport, exposition)
        } else {
            LockController::new(settings, transport, exposition)
        };

        self.locks.insert(
            device_id,
            LockEntry {
                accessory,
                controller: controller.clone(),
            },
        );
        Ok(controller)
    }

    pub fn lock(&self, device_id: &str) -> Option<&LockEntry> {
        self.locks.get(device_id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Seconds since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    START
        .get_or_init(std::time::Instant::now)
        .elapsed()
        .as_secs()
}

/// Spawn a background task that emits a heartbeat SSE every `interval`.
pub fn spawn_heartbeat(bus: broadcast::Sender<BusMsg>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let ts = Utc::now().timestamp_millis();
            let _ = bus.send(BusMsg::Heartbeat { ts_millis: ts });
        }
    });
}
