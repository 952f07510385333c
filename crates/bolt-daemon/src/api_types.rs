//! Request and response types for all bolt-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use bolt_engine::{ControllerSnapshot, RequestOutcome};
use bolt_schemas::TargetState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AccessorySnapshot;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    pub locks: usize,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// /v1/locks  /v1/locks/:device_id
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockListResponse {
    pub locks: Vec<AccessorySnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockDetailResponse {
    pub accessory: AccessorySnapshot,
    pub controller: ControllerSnapshot,
}

// ---------------------------------------------------------------------------
// /v1/locks/:device_id/target
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResponse {
    pub device_id: String,
    pub target: TargetState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTargetRequest {
    pub target: TargetState,
}

/// Flattened [`RequestOutcome`]. `outcome` is one of
/// "coalesced" | "retargeted" | "dispatched" | "dispatch_failed".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetTargetResponse {
    pub device_id: String,
    pub requested: TargetState,
    pub outcome: String,
    pub epoch: Option<u64>,
    pub command_id: Option<Uuid>,
    pub previous: Option<TargetState>,
    pub reconciled_to: Option<TargetState>,
    pub error: Option<String>,
}

impl SetTargetResponse {
    pub fn from_outcome(device_id: &str, requested: TargetState, outcome: &RequestOutcome) -> Self {
        let mut resp = Self {
            device_id: device_id.to_string(),
            requested,
            outcome: String::new(),
            epoch: None,
            command_id: None,
            previous: None,
            reconciled_to: None,
            error: None,
        };
        match outcome {
            RequestOutcome::Coalesced => {
                resp.outcome = "coalesced".to_string();
            }
            RequestOutcome::Retargeted { previous } => {
                resp.outcome = "retargeted".to_string();
                resp.previous = Some(*previous);
            }
            RequestOutcome::Dispatched { epoch, command_id } => {
                resp.outcome = "dispatched".to_string();
                resp.epoch = Some(*epoch);
                resp.command_id = Some(*command_id);
            }
            RequestOutcome::AcceptedAfterEnd { epoch, command_id } => {
                resp.outcome = "accepted_after_end".to_string();
                resp.epoch = Some(*epoch);
                resp.command_id = Some(*command_id);
            }
            RequestOutcome::DispatchFailed {
                epoch,
                error,
                reconciled_to,
            } => {
                resp.outcome = "dispatch_failed".to_string();
                resp.epoch = Some(*epoch);
                resp.reconciled_to = *reconciled_to;
                resp.error = Some(error.to_string());
            }
        }
        resp
    }
}
