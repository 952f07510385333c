//! Test doubles for the lock bridge.
//!
//! - [`FakeLockTransport`]: scripted device with failure injection, latency,
//!   and optional convergence on dispatch.
//! - [`RecordingExposition`]: captures every publish in order.
//!
//! No network I/O. Latency uses `tokio::time::sleep`, so paused-clock tests
//! stay deterministic.

mod exposition;
mod transport;

pub use exposition::{Exposed, RecordingExposition};
pub use transport::{DispatchRecord, FakeLockTransport};

use bolt_schemas::{SensorReading, READING_KIND_BATTERY, READING_KIND_LOCK};
use chrono::Utc;

pub fn lock_reading(value: &str) -> SensorReading {
    SensorReading::new(READING_KIND_LOCK, value, Utc::now())
}

pub fn battery_reading(value: &str) -> SensorReading {
    SensorReading::new(READING_KIND_BATTERY, value, Utc::now())
}
