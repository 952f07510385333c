use std::sync::{Mutex, MutexGuard};

use bolt_engine::LockExposition;
use bolt_schemas::{BatteryStatus, LockState, TargetState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposed {
    Current(LockState),
    Target(TargetState),
    Battery(BatteryStatus),
}

/// Records every publish, in order.
#[derive(Debug, Default)]
pub struct RecordingExposition {
    events: Mutex<Vec<Exposed>>,
}

impl RecordingExposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Exposed> {
        self.lock().clone()
    }

    pub fn targets(&self) -> Vec<TargetState> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Exposed::Target(t) => Some(*t),
                _ => None,
            })
            .collect()
    }

    pub fn current_states(&self) -> Vec<LockState> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Exposed::Current(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn batteries(&self) -> Vec<BatteryStatus> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                Exposed::Battery(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn last_target(&self) -> Option<TargetState> {
        self.targets().last().copied()
    }

    pub fn last_current(&self) -> Option<LockState> {
        self.current_states().last().copied()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Exposed>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LockExposition for RecordingExposition {
    fn publish_current_state(&self, state: LockState) {
        self.lock().push(Exposed::Current(state));
    }

    fn publish_target_state(&self, target: TargetState) {
        self.lock().push(Exposed::Target(target));
    }

    fn publish_battery(&self, battery: BatteryStatus) {
        self.lock().push(Exposed::Battery(battery));
    }
}
