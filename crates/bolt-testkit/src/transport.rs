use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bolt_schemas::{CommandAck, SensorReading, LOCK_VALUE_LOCKED};
use bolt_transport::{LockTransport, TransportError};
use uuid::Uuid;

use crate::{battery_reading, lock_reading};

/// The "lock" value the fake reports after an unlock command converges.
const LOCK_VALUE_UNLOCKED: &str = "unlocked";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub device_id: String,
    pub desired_locked: bool,
    pub failed: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    /// `None` = no "lock" reading at all.
    lock_value: Option<String>,
    battery_value: Option<String>,
    fail_queries: bool,
    fail_dispatch: bool,
    converge_on_dispatch: bool,
    query_latency: Duration,
    dispatch_latency: Duration,
    queries: usize,
    completed_queries: usize,
    active_queries: usize,
    max_active_queries: usize,
    dispatches: Vec<DispatchRecord>,
}

/// Scripted in-memory device.
///
/// Behaviour flags are sampled when a call starts, so changing them while a
/// slow call is suspended affects only later calls.
#[derive(Debug, Default)]
pub struct FakeLockTransport {
    state: Mutex<FakeState>,
}

impl FakeLockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device currently reports `"lock" = value`.
    pub fn with_lock_value(self, value: &str) -> Self {
        self.set_lock_value(Some(value));
        self
    }

    pub fn with_battery(self, value: &str) -> Self {
        self.set_battery(Some(value));
        self
    }

    /// Successful commands move the bolt, as a healthy device would.
    pub fn converging(self) -> Self {
        self.state().converge_on_dispatch = true;
        self
    }

    pub fn set_lock_value(&self, value: Option<&str>) {
        self.state().lock_value = value.map(str::to_string);
    }

    pub fn set_locked(&self, locked: bool) {
        let value = if locked { LOCK_VALUE_LOCKED } else { LOCK_VALUE_UNLOCKED };
        self.set_lock_value(Some(value));
    }

    pub fn set_battery(&self, value: Option<&str>) {
        self.state().battery_value = value.map(str::to_string);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.state().fail_queries = fail;
    }

    pub fn set_fail_dispatch(&self, fail: bool) {
        self.state().fail_dispatch = fail;
    }

    pub fn set_query_latency(&self, latency: Duration) {
        self.state().query_latency = latency;
    }

    pub fn set_dispatch_latency(&self, latency: Duration) {
        self.state().dispatch_latency = latency;
    }

    /// Queries started, including any still suspended.
    pub fn query_count(&self) -> usize {
        self.state().queries
    }

    pub fn completed_query_count(&self) -> usize {
        self.state().completed_queries
    }

    /// Highest number of queries that were suspended at the same time.
    pub fn max_concurrent_queries(&self) -> usize {
        self.state().max_active_queries
    }

    /// Completed dispatch attempts, successful or not, in completion order.
    pub fn dispatches(&self) -> Vec<DispatchRecord> {
        self.state().dispatches.clone()
    }

    pub fn dispatch_count(&self) -> usize {
        self.state().dispatches.len()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LockTransport for FakeLockTransport {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn query_readings(&self, _device_id: &str) -> Result<Vec<SensorReading>, TransportError> {
        let (latency, fail) = {
            let mut st = self.state();
            st.queries += 1;
            st.active_queries += 1;
            st.max_active_queries = st.max_active_queries.max(st.active_queries);
            (st.query_latency, st.fail_queries)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut st = self.state();
        st.active_queries -= 1;
        st.completed_queries += 1;
        if fail {
            return Err(TransportError::Transport("injected query failure".to_string()));
        }

        let mut readings = Vec::new();
        if let Some(value) = &st.battery_value {
            readings.push(battery_reading(value));
        }
        if let Some(value) = &st.lock_value {
            readings.push(lock_reading(value));
        }
        Ok(readings)
    }

    async fn dispatch_command(
        &self,
        device_id: &str,
        desired_locked: bool,
    ) -> Result<CommandAck, TransportError> {
        let (latency, fail) = {
            let st = self.state();
            (st.dispatch_latency, st.fail_dispatch)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut st = self.state();
        st.dispatches.push(DispatchRecord {
            device_id: device_id.to_string(),
            desired_locked,
            failed: fail,
        });
        if fail {
            return Err(TransportError::Api {
                status: Some(502),
                message: "injected dispatch failure".to_string(),
            });
        }
        if st.converge_on_dispatch {
            let value = if desired_locked { LOCK_VALUE_LOCKED } else { LOCK_VALUE_UNLOCKED };
            st.lock_value = Some(value.to_string());
        }
        Ok(CommandAck {
            command_id: Uuid::new_v4(),
            locked: desired_locked,
        })
    }
}
