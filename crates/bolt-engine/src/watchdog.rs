//! Per-session convergence deadline.

use std::sync::Arc;

use tracing::{info, warn};

use crate::controller::{ControllerState, LockController};
use crate::timer::TimerHandle;

impl LockController {
    /// Arm the watchdog for session `epoch`, replacing any prior one.
    pub(crate) fn arm_watchdog(&self, st: &mut ControllerState, epoch: u64) {
        if let Some(prev) = st.watchdog.take() {
            prev.cancel();
        }

        let weak = Arc::downgrade(&self.inner);
        let timeout = self.inner.settings.watchdog_timeout();
        st.watchdog = Some(TimerHandle::arm(epoch, timeout, async move {
            if let Some(inner) = weak.upgrade() {
                LockController::from_inner(inner)
                    .on_watchdog_expired(epoch)
                    .await;
            }
        }));
    }

    pub(crate) fn disarm_watchdog(&self, st: &mut ControllerState) {
        if let Some(handle) = st.watchdog.take() {
            handle.cancel();
        }
    }

    async fn on_watchdog_expired(&self, epoch: u64) {
        let device_id = self.device_id();

        {
            let mut st = self.inner.state.lock().await;
            if st.watchdog.as_ref().map(TimerHandle::id) != Some(epoch) {
                return;
            }
            if let Some(handle) = st.watchdog.take() {
                handle.release();
            }
            if !st.session.end(epoch) {
                return;
            }
            st.stats.watchdog_expirations += 1;
            warn!(
                device_id,
                epoch,
                desired = ?st.session.desired(),
                observed = %st.observed,
                "watchdog expired before convergence; reconciling"
            );
        }

        if let Some(target) = self.reconcile(epoch).await {
            info!(device_id, epoch, %target, "watchdog recovery complete");
        }
    }
}
