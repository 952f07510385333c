//! Typed view of the merged configuration.
//!
//! ```yaml
//! daemon:
//!   bind_addr: "127.0.0.1:8898"
//!   heartbeat_secs: 5
//! transport:
//!   base_url: "http://lock-hub.local"
//!   token_env: "BOLT_TRANSPORT_TOKEN"
//!   request_timeout_ms: 10000
//! locks:
//!   - device_id: "front-door"
//!     name: "Front Door"
//!     poll_interval_ms: 5000
//!     auto_lock_minutes: 0
//! ```

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::LoadedConfig;

/// Lower bound for `poll_interval_ms`.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub daemon: DaemonSection,
    pub transport: TransportSection,
    pub locks: Vec<LockEntryConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSection {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSection {
    pub base_url: String,
    /// NAME of the env var holding the bearer token. Absent = no auth header.
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// One physical lock. Each entry becomes an independent controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntryConfig {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 0 disables auto-relock.
    #[serde(default)]
    pub auto_lock_minutes: u32,
}

impl LockEntryConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.device_id)
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8898".to_string()
}

fn default_heartbeat_secs() -> u64 {
    5
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_poll_interval_ms() -> u64 {
    5_000
}

impl BridgeConfig {
    /// Deserialize and validate from a loaded (merged, guarded) config.
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg: BridgeConfig = serde_json::from_value(loaded.config_json.clone())
            .context("CONFIG_INVALID: config does not match the bridge schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.daemon.heartbeat_secs == 0 {
            bail!("CONFIG_INVALID: /daemon/heartbeat_secs must be > 0");
        }
        if self.transport.base_url.trim().is_empty() {
            bail!("CONFIG_INVALID: /transport/base_url must not be empty");
        }
        if self.transport.request_timeout_ms == 0 {
            bail!("CONFIG_INVALID: /transport/request_timeout_ms must be > 0");
        }
        if self.locks.is_empty() {
            bail!("CONFIG_INVALID: /locks must list at least one lock");
        }

        let mut seen: BTreeSet<&str> = BTreeSet::new();
        for (i, lock) in self.locks.iter().enumerate() {
            let id = lock.device_id.trim();
            if id.is_empty() {
                bail!("CONFIG_INVALID: /locks/{i}/device_id must not be empty");
            }
            if !seen.insert(id) {
                bail!("CONFIG_INVALID: /locks/{i}/device_id '{id}' is duplicated");
            }
            if lock.poll_interval_ms < MIN_POLL_INTERVAL_MS {
                bail!(
                    "CONFIG_INVALID: /locks/{i}/poll_interval_ms={} is below the minimum of {}ms",
                    lock.poll_interval_ms,
                    MIN_POLL_INTERVAL_MS
                );
            }
        }
        Ok(())
    }
}
