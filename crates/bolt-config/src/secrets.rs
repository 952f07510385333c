//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only env var NAMES (e.g. `"BOLT_TRANSPORT_TOKEN"`).
//! - The daemon calls [`resolve_secrets`] once at startup and passes the
//!   result into the transport constructor. No other code reads the env.
//! - `Debug` redacts values; errors name the variable, never the value.

use anyhow::{bail, Result};

use crate::BridgeConfig;

/// All runtime-resolved secrets for one daemon process.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// Bearer token for the device API. `None` when no `token_env` is configured.
    pub transport_token: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "transport_token",
                &self.transport_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Resolve a named environment variable; blank counts as unset.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve every secret the config names.
///
/// A `token_env` that is configured but unset is `SECRETS_MISSING`.
pub fn resolve_secrets(cfg: &BridgeConfig) -> Result<ResolvedSecrets> {
    let transport_token = match cfg.transport.token_env.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(var) => match resolve_env(var) {
            Some(v) => Some(v),
            None => bail!(
                "SECRETS_MISSING: required env var '{}' (transport token) is not set or empty",
                var
            ),
        },
    };

    Ok(ResolvedSecrets { transport_token })
}
