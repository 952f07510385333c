//! Abandon an unmet target in favour of observed truth.

use bolt_schemas::TargetState;
use tracing::{debug, info};

use crate::controller::LockController;

impl LockController {
    /// Recovery after session `epoch` ended without converging.
    ///
    /// Re-observes the device (falling back to the last observed state when
    /// the query fails) and writes the mapped target back. Returns `None`
    /// when a newer session began meanwhile; that session owns the target.
    pub(crate) async fn reconcile(&self, epoch: u64) -> Option<TargetState> {
        let device_id = self.device_id();
        let fresh = self.observe().await;

        let mut st = self.inner.state.lock().await;
        let observed = fresh.unwrap_or(st.observed);
        let target = TargetState::from_observed(observed);

        if !st.session.reconcile(epoch, target) {
            debug!(
                device_id,
                epoch,
                current_epoch = st.session.epoch(),
                "reconciliation skipped; newer session owns the target"
            );
            return None;
        }

        self.inner.exposition.publish_target_state(target);
        info!(device_id, epoch, %observed, %target, fresh = fresh.is_some(), "target reconciled to observed state");
        Some(target)
    }
}
