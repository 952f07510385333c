//! Device transport boundary for the lock bridge.
//!
//! This crate defines the [`LockTransport`] port the engine talks to and one
//! concrete adapter, [`HttpLockTransport`]. The port knows nothing about
//! sessions, targets or timers: it queries readings and dispatches commands.

use std::fmt;

use async_trait::async_trait;
use bolt_schemas::{CommandAck, SensorReading};

mod http;

pub use http::HttpLockTransport;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that a [`LockTransport`] implementation may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Network failure, timeout, or connection refused.
    Transport(String),
    /// The device API answered with an application-level rejection.
    Api { status: Option<u16>, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The adapter was constructed with an unusable setting.
    Config(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Transport(msg) => write!(f, "transport error: {msg}"),
            TransportError::Api {
                status: Some(s),
                message,
            } => write!(f, "device api error status={s}: {message}"),
            TransportError::Api {
                status: None,
                message,
            } => write!(f, "device api error: {message}"),
            TransportError::Decode(msg) => write!(f, "decode error: {msg}"),
            TransportError::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Device query/command contract.
///
/// Object safe, so the engine holds an `Arc<dyn LockTransport>`. Calls may
/// take arbitrarily long; callers never cancel them.
#[async_trait]
pub trait LockTransport: Send + Sync {
    /// Short identifier for logs (e.g. `"http"`).
    fn name(&self) -> &'static str;

    /// Fetch the current reading set for one device.
    ///
    /// Readings come back in API order; interpretation is the caller's job.
    async fn query_readings(&self, device_id: &str) -> Result<Vec<SensorReading>, TransportError>;

    /// Ask the device to throw (`true`) or retract (`false`) the bolt.
    ///
    /// `Ok` means the request was accepted, not that the bolt moved.
    async fn dispatch_command(
        &self,
        device_id: &str,
        desired_locked: bool,
    ) -> Result<CommandAck, TransportError>;
}
