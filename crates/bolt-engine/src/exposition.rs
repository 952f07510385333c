use bolt_schemas::{BatteryStatus, LockState, TargetState};

/// Outbound port to the home-automation layer.
///
/// Calls are made from inside the controller's critical section, so
/// implementations must not block or call back into the controller.
pub trait LockExposition: Send + Sync {
    /// Every successful observation, including reconciliation re-queries.
    fn publish_current_state(&self, state: LockState);

    /// Every accepted request (before the device converges) and every
    /// reconciliation.
    fn publish_target_state(&self, target: TargetState);

    /// Whenever a battery reading maps cleanly.
    fn publish_battery(&self, battery: BatteryStatus);
}
