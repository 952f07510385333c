//! bolt-engine
//!
//! Per-lock command reconciliation. One [`LockController`] owns one lock's
//! session, observed state, watchdog and auto-lock timers, and the poller
//! that drives them.
//!
//! # Invariants (hold whenever the state mutex is released)
//!
//! 1. The watchdog is armed exactly while a session is in flight.
//! 2. A session in flight always has a desired target.
//! 3. The auto-lock timer is armed only while the last observation was
//!    `UNSECURED`.
//! 4. One session per controller; a new one begins only once the previous
//!    one has ended.
//!
//! Every state transition is one synchronous critical section. The mutex is
//! never held across a transport call or a timer sleep.

mod auto_lock;
mod controller;
mod exposition;
mod poller;
mod reconcile;
mod session;
mod settings;
mod timer;
mod watchdog;

pub use controller::{ControllerSnapshot, ControllerStats, LockController, RequestOutcome};
pub use exposition::LockExposition;
pub use session::{RequestDecision, Session};
pub use settings::LockSettings;
