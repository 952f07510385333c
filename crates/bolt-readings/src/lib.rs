//! bolt-readings
//!
//! Translators from raw [`SensorReading`](bolt_schemas::SensorReading) sets
//! to the canonical values the engine and the exposition layer consume.
//!
//! - Lock state is a pure function of the latest reading set. No hysteresis,
//!   no memory of earlier polls.
//! - An absent reading is a valid, handled case, never an error.
//! - A present but unparseable battery reading is a [`MalformedReading`];
//!   callers log it and skip that one attribute.
//!
//! Deterministic, pure logic. No IO.

mod battery;
mod state;

pub use battery::{map_battery, MalformedReading, LOW_BATTERY_THRESHOLD_PERCENT};
pub use state::translate_lock_state;
