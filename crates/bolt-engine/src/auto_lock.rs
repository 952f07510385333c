//! Auto-relock policy, driven by each observation.

use std::sync::Arc;

use bolt_schemas::{LockState, TargetState};
use tracing::{info, warn};

use crate::controller::{ControllerState, LockController, RequestOutcome};
use crate::timer::TimerHandle;

impl LockController {
    pub(crate) fn schedule_auto_lock(&self, st: &mut ControllerState, observed: LockState) {
        let device_id = self.device_id();

        match observed {
            LockState::Unsecured => {
                let Some(delay) = self.inner.settings.auto_lock_delay else {
                    return;
                };
                if st.auto_lock.is_some() {
                    return;
                }
                st.auto_lock_arms += 1;
                let id = st.auto_lock_arms;
                let weak = Arc::downgrade(&self.inner);
                st.auto_lock = Some(TimerHandle::arm(id, delay, async move {
                    if let Some(inner) = weak.upgrade() {
                        LockController::from_inner(inner).on_auto_lock_fired(id).await;
                    }
                }));
                info!(device_id, delay_secs = delay.as_secs(), "auto-lock armed");
            }
            // Unknown also cancels: the timer only runs while the bolt is
            // known to be open.
            LockState::Secured | LockState::Unknown => {
                if let Some(handle) = st.auto_lock.take() {
                    handle.cancel();
                    info!(device_id, %observed, "auto-lock cancelled");
                }
            }
        }
    }

    async fn on_auto_lock_fired(&self, id: u64) {
        let device_id = self.device_id();

        {
            let mut st = self.inner.state.lock().await;
            if st.auto_lock.as_ref().map(TimerHandle::id) != Some(id) {
                return;
            }
            if let Some(handle) = st.auto_lock.take() {
                handle.release();
            }
            st.stats.auto_lock_fires += 1;
        }

        info!(device_id, "auto-lock fired; requesting SECURED");
        match self.request_target(TargetState::Secured).await {
            RequestOutcome::DispatchFailed { error, .. } => {
                warn!(device_id, error = %error, "auto-lock dispatch failed");
            }
            outcome => {
                info!(device_id, ?outcome, "auto-lock request handled");
            }
        }
    }
}
