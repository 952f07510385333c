//! Single-flight session bookkeeping.
//!
//! Pure state machine, no IO and no timers. The controller applies every
//! transition while holding its state mutex.
//!
//! ```text
//! IDLE      --request(T)-------------> IN_FLIGHT(T)   Begin
//! IN_FLIGHT --request(T)-------------> IN_FLIGHT(T)   Coalesced
//! IN_FLIGHT --request(T2 != T)-------> IN_FLIGHT(T2)  Retargeted (no dispatch)
//! IN_FLIGHT --converge(implied(T))---> IDLE
//! IN_FLIGHT --end(epoch)-------------> IDLE           watchdog / dispatch failure (abandoned)
//! ```

use bolt_schemas::{LockState, TargetState};

/// What the caller must do after [`Session::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// Same target already in flight. Nothing to do.
    Coalesced,
    /// Different target recorded against the running session. No dispatch,
    /// no watchdog rearm.
    Retargeted { previous: TargetState },
    /// A new session started. Arm the watchdog and dispatch.
    Begin { epoch: u64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    in_flight: bool,
    desired: Option<TargetState>,
    /// Id of the current (or most recent) session. 0 = none yet.
    epoch: u64,
    /// The most recent session was force-ended rather than converged.
    abandoned: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn desired(&self) -> Option<TargetState> {
        self.desired
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn request(&mut self, target: TargetState) -> RequestDecision {
        if self.in_flight {
            match self.desired {
                Some(current) if current == target => return RequestDecision::Coalesced,
                Some(previous) => {
                    self.desired = Some(target);
                    return RequestDecision::Retargeted { previous };
                }
                // In flight without a target cannot be reached through this
                // API; restart the session rather than keep it.
                None => {}
            }
        }

        self.desired = Some(target);
        self.in_flight = true;
        self.abandoned = false;
        self.epoch += 1;
        RequestDecision::Begin { epoch: self.epoch }
    }

    /// Completion check. Ends the session when `observed` is the state its
    /// target implies and returns the ended epoch.
    pub fn converge(&mut self, observed: LockState) -> Option<u64> {
        let desired = self.desired?;
        if self.in_flight && desired.implied_lock_state() == observed {
            self.in_flight = false;
            Some(self.epoch)
        } else {
            None
        }
    }

    /// Force-end session `epoch`. Returns `false` when that session is no
    /// longer the one in flight (already converged, or superseded).
    pub fn end(&mut self, epoch: u64) -> bool {
        if self.in_flight && self.epoch == epoch {
            self.in_flight = false;
            self.abandoned = true;
            true
        } else {
            false
        }
    }

    /// Session `epoch` is neither in flight nor converged: it was force-ended
    /// or a newer session replaced it.
    pub fn is_stale(&self, epoch: u64) -> bool {
        self.epoch != epoch || (!self.in_flight && self.abandoned)
    }

    /// Overwrite the target with observed truth after session `epoch` was
    /// abandoned. Refused once a newer session has begun.
    pub fn reconcile(&mut self, epoch: u64, target: TargetState) -> bool {
        if self.epoch != epoch || self.in_flight {
            return false;
        }
        self.desired = Some(target);
        true
    }
}
