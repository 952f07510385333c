use bolt_schemas::{LockState, SensorReading, LOCK_VALUE_LOCKED, READING_KIND_LOCK};

/// Derive the canonical lock state from one poll's readings.
///
/// The first `"lock"` reading wins. Its absence yields `Unknown`; any value
/// other than exactly `"locked"` yields `Unsecured`.
pub fn translate_lock_state(readings: &[SensorReading]) -> LockState {
    match readings.iter().find(|r| r.is_kind(READING_KIND_LOCK)) {
        None => LockState::Unknown,
        Some(r) if r.value == LOCK_VALUE_LOCKED => LockState::Secured,
        Some(_) => LockState::Unsecured,
    }
}
