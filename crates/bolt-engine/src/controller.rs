use std::sync::Arc;

use bolt_schemas::{BatteryStatus, LockState, TargetState};
use bolt_transport::{LockTransport, TransportError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::exposition::LockExposition;
use crate::poller;
use crate::session::{RequestDecision, Session};
use crate::settings::LockSettings;
use crate::timer::TimerHandle;

// ---------------------------------------------------------------------------
// Public result types
// ---------------------------------------------------------------------------

/// Result of [`LockController::request_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The same target is already in flight; nothing was sent.
    Coalesced,
    /// A session is in flight for another target. The new target is
    /// recorded; no command was sent and the watchdog keeps its deadline.
    Retargeted { previous: TargetState },
    /// The device accepted the command. Convergence is confirmed by a
    /// later poll.
    Dispatched { epoch: u64, command_id: Uuid },
    /// The device accepted the command only after its session had been
    /// abandoned (watchdog) or replaced. The target already reflects
    /// reconciliation; nothing is pending for this command.
    AcceptedAfterEnd { epoch: u64, command_id: Uuid },
    /// The dispatch failed. `reconciled_to` is the target written back from
    /// observed state, or `None` when the session had already been ended
    /// elsewhere and the failure was ignored.
    DispatchFailed {
        epoch: u64,
        error: TransportError,
        reconciled_to: Option<TargetState>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerStats {
    pub observations: u64,
    pub poll_failures: u64,
    pub malformed_readings: u64,
    pub dispatches: u64,
    pub dispatch_failures: u64,
    pub watchdog_expirations: u64,
    pub auto_lock_fires: u64,
}

/// Point-in-time copy of one controller's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub device_id: String,
    pub observed: LockState,
    pub desired: Option<TargetState>,
    pub in_flight: bool,
    pub epoch: u64,
    pub watchdog_armed: bool,
    pub auto_lock_armed: bool,
    pub battery: Option<BatteryStatus>,
    pub last_observed_at: Option<DateTime<Utc>>,
    pub stats: ControllerStats,
}

impl ControllerSnapshot {
    /// The controller invariants, evaluated on this snapshot.
    pub fn invariants_hold(&self) -> bool {
        let watchdog_tracks_session = self.watchdog_armed == self.in_flight;
        let in_flight_has_target = !self.in_flight || self.desired.is_some();
        let auto_lock_only_when_open = !self.auto_lock_armed || self.observed == LockState::Unsecured;
        watchdog_tracks_session && in_flight_has_target && auto_lock_only_when_open
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

pub(crate) struct ControllerState {
    pub(crate) session: Session,
    pub(crate) observed: LockState,
    pub(crate) last_observed_at: Option<DateTime<Utc>>,
    pub(crate) battery: Option<BatteryStatus>,
    /// Id = session epoch.
    pub(crate) watchdog: Option<TimerHandle>,
    /// Id = `auto_lock_arms` at arm time.
    pub(crate) auto_lock: Option<TimerHandle>,
    pub(crate) auto_lock_arms: u64,
    pub(crate) stats: ControllerStats,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            session: Session::new(),
            observed: LockState::Unknown,
            last_observed_at: None,
            battery: None,
            watchdog: None,
            auto_lock: None,
            auto_lock_arms: 0,
            stats: ControllerStats::default(),
        }
    }
}

pub(crate) struct Inner {
    pub(crate) settings: LockSettings,
    pub(crate) transport: Arc<dyn LockTransport>,
    pub(crate) exposition: Arc<dyn LockExposition>,
    pub(crate) state: Mutex<ControllerState>,
}

// ---------------------------------------------------------------------------
// LockController
// ---------------------------------------------------------------------------

/// Reconciliation engine for one lock. Cheap to clone; clones share state.
///
/// Timers and the poller hold weak references, so dropping the last clone
/// stops everything.
#[derive(Clone)]
pub struct LockController {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for LockController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockController")
            .field("device_id", &self.inner.settings.device_id)
            .field("transport", &self.inner.transport.name())
            .finish()
    }
}

impl LockController {
    /// Build a controller without a poller. Observations happen only
    /// through [`poll_once`](Self::poll_once) and the on-demand queries.
    pub fn new(
        settings: LockSettings,
        transport: Arc<dyn LockTransport>,
        exposition: Arc<dyn LockExposition>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                transport,
                exposition,
                state: Mutex::new(ControllerState::new()),
            }),
        }
    }

    /// Build a controller and start its poller. The first poll runs
    /// immediately. Must be called from inside a tokio runtime.
    pub fn spawn(
        settings: LockSettings,
        transport: Arc<dyn LockTransport>,
        exposition: Arc<dyn LockExposition>,
    ) -> Self {
        let controller = Self::new(settings, transport, exposition);
        poller::spawn_poller(&controller.inner);
        controller
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub fn device_id(&self) -> &str {
        &self.inner.settings.device_id
    }

    pub fn settings(&self) -> &LockSettings {
        &self.inner.settings
    }

    /// Set-target-state entry point, shared by external callers and the
    /// auto-lock timer.
    ///
    /// A new session dispatches in the caller's task; a dispatch failure is
    /// reconciled before this returns.
    pub async fn request_target(&self, target: TargetState) -> RequestOutcome {
        let device_id = self.device_id();

        let epoch = {
            let mut st = self.inner.state.lock().await;
            match st.session.request(target) {
                RequestDecision::Coalesced => {
                    debug!(device_id, %target, "request coalesced with in-flight session");
                    return RequestOutcome::Coalesced;
                }
                RequestDecision::Retargeted { previous } => {
                    self.inner.exposition.publish_target_state(target);
                    info!(
                        device_id,
                        %previous,
                        %target,
                        epoch = st.session.epoch(),
                        "target changed mid-flight; waiting on current session"
                    );
                    return RequestOutcome::Retargeted { previous };
                }
                RequestDecision::Begin { epoch } => {
                    self.inner.exposition.publish_target_state(target);
                    self.arm_watchdog(&mut st, epoch);
                    st.stats.dispatches += 1;
                    info!(device_id, %target, epoch, "session begin");
                    epoch
                }
            }
        };

        let result = self
            .inner
            .transport
            .dispatch_command(device_id, target.desired_locked())
            .await;

        match result {
            Ok(ack) => {
                let stale = self.inner.state.lock().await.session.is_stale(epoch);
                if stale {
                    debug!(device_id, epoch, command_id = %ack.command_id, "command accepted after session ended");
                    return RequestOutcome::AcceptedAfterEnd {
                        epoch,
                        command_id: ack.command_id,
                    };
                }
                info!(device_id, epoch, command_id = %ack.command_id, "command accepted");
                RequestOutcome::Dispatched {
                    epoch,
                    command_id: ack.command_id,
                }
            }
            Err(error) => {
                let ended = {
                    let mut st = self.inner.state.lock().await;
                    st.stats.dispatch_failures += 1;
                    let ended = st.session.end(epoch);
                    if ended {
                        self.disarm_watchdog(&mut st);
                    }
                    ended
                };

                if !ended {
                    warn!(device_id, epoch, error = %error, "late dispatch failure ignored; session already ended");
                    return RequestOutcome::DispatchFailed {
                        epoch,
                        error,
                        reconciled_to: None,
                    };
                }

                warn!(device_id, epoch, error = %error, "dispatch failed; reconciling");
                let reconciled_to = self.reconcile(epoch).await;
                RequestOutcome::DispatchFailed {
                    epoch,
                    error,
                    reconciled_to,
                }
            }
        }
    }

    /// Get-target-state entry point.
    ///
    /// Returns the desired target when one exists. Otherwise observes the
    /// device and maps what it sees; if that query fails, maps the last
    /// observed state.
    pub async fn current_target(&self) -> TargetState {
        let desired = self.inner.state.lock().await.session.desired();
        if let Some(target) = desired {
            return target;
        }

        let observed = match self.observe().await {
            Some(observed) => observed,
            None => self.inner.state.lock().await.observed,
        };
        TargetState::from_observed(observed)
    }

    /// Last observed lock state. Does not query the device.
    pub async fn current_state(&self) -> LockState {
        self.inner.state.lock().await.observed
    }

    /// Run one observation cycle now. `None` when the query failed.
    pub async fn poll_once(&self) -> Option<LockState> {
        self.observe().await
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let st = self.inner.state.lock().await;
        ControllerSnapshot {
            device_id: self.inner.settings.device_id.clone(),
            observed: st.observed,
            desired: st.session.desired(),
            in_flight: st.session.in_flight(),
            epoch: st.session.epoch(),
            watchdog_armed: st.watchdog.is_some(),
            auto_lock_armed: st.auto_lock.is_some(),
            battery: st.battery,
            last_observed_at: st.last_observed_at,
            stats: st.stats,
        }
    }
}
