//! Observation cycle and the recurring poll task.
//!
//! One poll task per controller. A tick awaits its query before the next
//! tick is taken, and late ticks are skipped, so polls of one lock never
//! overlap.

use std::sync::Arc;

use bolt_readings::{map_battery, translate_lock_state, MalformedReading};
use bolt_schemas::{BatteryStatus, LockState};
use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::controller::{ControllerState, Inner, LockController};

pub(crate) fn spawn_poller(inner: &Arc<Inner>) {
    let weak = Arc::downgrade(inner);
    let period = inner.settings.poll_interval;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            LockController::from_inner(inner).observe().await;
        }
    });
}

impl LockController {
    /// Query, translate, publish, then run the completion check and
    /// auto-lock scheduling. A failed query changes nothing.
    pub(crate) async fn observe(&self) -> Option<LockState> {
        let device_id = self.device_id();

        let readings = match self.inner.transport.query_readings(device_id).await {
            Ok(readings) => readings,
            Err(error) => {
                warn!(device_id, error = %error, "readings query failed; keeping last observed state");
                self.inner.state.lock().await.stats.poll_failures += 1;
                return None;
            }
        };

        let observed = translate_lock_state(&readings);
        let battery = map_battery(&readings);

        let mut st = self.inner.state.lock().await;
        self.apply_observation(&mut st, observed, battery);
        Some(observed)
    }

    fn apply_observation(
        &self,
        st: &mut ControllerState,
        observed: LockState,
        battery: Result<Option<BatteryStatus>, MalformedReading>,
    ) {
        let device_id = self.device_id();

        st.observed = observed;
        st.last_observed_at = Some(Utc::now());
        st.stats.observations += 1;
        self.inner.exposition.publish_current_state(observed);

        match battery {
            Ok(Some(status)) => {
                st.battery = Some(status);
                self.inner.exposition.publish_battery(status);
            }
            Ok(None) => {}
            Err(malformed) => {
                st.stats.malformed_readings += 1;
                warn!(device_id, error = %malformed, "battery reading skipped");
            }
        }

        if let Some(epoch) = st.session.converge(observed) {
            self.disarm_watchdog(st);
            info!(device_id, epoch, %observed, "session converged");
        }

        self.schedule_auto_lock(st, observed);
    }
}
