//! bolt-schemas
//!
//! Shared data model for the lock bridge. Everything here is plain data:
//! no IO, no clocks, no policy. The transport produces [`SensorReading`]s,
//! the translators in `bolt-readings` derive [`LockState`] and
//! [`BatteryStatus`] from them, and the engine reasons in [`TargetState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reading kind carrying the bolt position.
pub const READING_KIND_LOCK: &str = "lock";
/// Reading kind carrying the battery percentage.
pub const READING_KIND_BATTERY: &str = "battery";
/// The only `"lock"` value that means the bolt is thrown.
pub const LOCK_VALUE_LOCKED: &str = "locked";

// ---------------------------------------------------------------------------
// SensorReading
// ---------------------------------------------------------------------------

/// A single raw reading as returned by the device API.
///
/// Values stay as strings; interpretation belongs to the translators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    pub kind: String,
    pub value: String,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    pub fn new(kind: impl Into<String>, value: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            timestamp,
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

// ---------------------------------------------------------------------------
// LockState
// ---------------------------------------------------------------------------

/// Canonical observed state of the bolt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LockState {
    Secured,
    Unsecured,
    /// No lock reading was present in the last observation.
    Unknown,
}

impl LockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Secured => "SECURED",
            LockState::Unsecured => "UNSECURED",
            LockState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TargetState
// ---------------------------------------------------------------------------

/// The state a caller (or the auto-lock policy) wants the bolt to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetState {
    Secured,
    Unsecured,
}

impl TargetState {
    /// Map an observation onto a target: only a confirmed `Secured` maps to
    /// `Secured`; `Unsecured` and `Unknown` both map to `Unsecured`.
    pub fn from_observed(observed: LockState) -> Self {
        match observed {
            LockState::Secured => TargetState::Secured,
            LockState::Unsecured | LockState::Unknown => TargetState::Unsecured,
        }
    }

    /// The observed state that confirms this target has been reached.
    pub fn implied_lock_state(&self) -> LockState {
        match self {
            TargetState::Secured => LockState::Secured,
            TargetState::Unsecured => LockState::Unsecured,
        }
    }

    /// Command payload for the transport: `true` = throw the bolt.
    pub fn desired_locked(&self) -> bool {
        matches!(self, TargetState::Secured)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetState::Secured => "SECURED",
            TargetState::Unsecured => "UNSECURED",
        }
    }
}

impl std::fmt::Display for TargetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BatteryStatus
// ---------------------------------------------------------------------------

/// Battery level exposed to the home-automation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// 0..=100
    pub percent: u8,
    pub low: bool,
}

// ---------------------------------------------------------------------------
// CommandAck
// ---------------------------------------------------------------------------

/// Acceptance of a lock/unlock command by the device API.
///
/// Acceptance is not convergence: the engine still waits for a poll to
/// observe the requested state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub command_id: Uuid,
    pub locked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_secured_observation_maps_to_secured_target() {
        assert_eq!(
            TargetState::from_observed(LockState::Secured),
            TargetState::Secured
        );
        assert_eq!(
            TargetState::from_observed(LockState::Unsecured),
            TargetState::Unsecured
        );
        assert_eq!(
            TargetState::from_observed(LockState::Unknown),
            TargetState::Unsecured
        );
    }

    #[test]
    fn implied_state_matches_target() {
        assert_eq!(
            TargetState::Secured.implied_lock_state(),
            LockState::Secured
        );
        assert_eq!(
            TargetState::Unsecured.implied_lock_state(),
            LockState::Unsecured
        );
        assert!(TargetState::Secured.desired_locked());
        assert!(!TargetState::Unsecured.desired_locked());
    }

    #[test]
    fn states_serialize_as_upper_snake() {
        assert_eq!(
            serde_json::to_string(&LockState::Unknown).unwrap(),
            "\"UNKNOWN\""
        );
        let t: TargetState = serde_json::from_str("\"UNSECURED\"").unwrap();
        assert_eq!(t, TargetState::Unsecured);
    }
}
