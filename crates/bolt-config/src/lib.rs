//! bolt-config
//!
//! Layered YAML configuration for the lock bridge.
//!
//! - Docs are merged in order: earlier docs are base, later docs override.
//! - The merged document is canonicalised and hashed so a deployment can log
//!   exactly which configuration it runs with.
//! - Literal secrets are refused. Config stores env var NAMES; values are
//!   resolved once at startup by [`secrets::resolve_secrets`].
//! - Keys nothing reads are reported by [`report_unused_keys`].
//! - [`BridgeConfig`] is the typed, validated view consumed by the daemon.

mod bridge;
pub mod secrets;

pub use bridge::{BridgeConfig, DaemonSection, LockEntryConfig, TransportSection};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;

/// Known secret-like prefixes. A leaf string value starting with one of these
/// aborts loading with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "Bearer ",    // pasted Authorization header
    "sk-",        // OpenAI / Stripe style
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
    "eyJ",        // JWT (base64 of '{"')
    "-----BEGIN", // PEM private keys
];

/// JSON-pointer prefixes actually read by the bridge.
///
/// Keep this in sync with `BridgeConfig`; a key missing here is reported as
/// unused even if serde would accept it.
pub const CONSUMED_POINTERS: &[&str] = &[
    "/daemon/bind_addr",
    "/daemon/heartbeat_secs",
    "/transport/base_url",
    "/transport/token_env",
    "/transport/request_timeout_ms",
];

/// Fields read from each `/locks/<i>` entry (`LockEntryConfig`).
pub const CONSUMED_LOCK_FIELDS: &[&str] = &[
    "device_id",
    "name",
    "poll_interval_ms",
    "auto_lock_minutes",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Consumed JSON-pointer prefixes used for this analysis (sorted, unique)
    pub consumed_prefixes: Vec<String>,
    /// Unused leaf pointers (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Produce an unused-key report against [`CONSUMED_POINTERS`] plus
/// [`CONSUMED_LOCK_FIELDS`] for every entry under `/locks`.
/// `Fail` returns an error when unused keys exist; `Warn` always returns the report.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let lock_count = config_json
        .pointer("/locks")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let lock_fields = (0..lock_count).flat_map(|idx| {
        CONSUMED_LOCK_FIELDS
            .iter()
            .map(move |field| format!("/locks/{idx}/{field}"))
    });

    let consumed_prefixes: Vec<String> = CONSUMED_POINTERS
        .iter()
        .map(|p| normalize_pointer(p))
        .chain(lock_fields)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let unused_leaf_pointers: Vec<String> = leaf_pointers(config_json)
        .into_iter()
        .filter(|leaf| !consumed_prefixes.iter().any(|prefix| pointer_covers(prefix, leaf)))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let report = UnusedKeyReport {
        consumed_prefixes,
        unused_leaf_pointers,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let shown: Vec<&str> = report
            .unused_leaf_pointers
            .iter()
            .take(12)
            .map(String::as_str)
            .collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are not read by the bridge: {}",
            report.unused_leaf_pointers.len(),
            shown.join(", ")
        );
    }

    Ok(report)
}

/// Leading "/", no trailing "/". The root is "/".
fn normalize_pointer(p: &str) -> String {
    format!("/{}", p.trim().trim_matches('/'))
}

/// `/a/b` covers `/a/b` and `/a/b/c`, but not `/a/bc`.
fn pointer_covers(prefix: &str, leaf: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    leaf.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// JSON pointers (RFC 6901) to every scalar leaf, sorted. Empty objects and
/// arrays contribute nothing.
fn leaf_pointers(root: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending: Vec<(String, &Value)> = vec![(String::new(), root)];

    while let Some((path, node)) = pending.pop() {
        match node {
            Value::Object(map) => {
                for (key, child) in map {
                    let token = key.replace('~', "~0").replace('/', "~1");
                    pending.push((format!("{path}/{token}"), child));
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    pending.push((format!("{path}/{idx}"), child));
                }
            }
            _ if path.is_empty() => out.push("/".to_string()),
            _ => out.push(path),
        }
    }

    out.sort();
    out
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("CONFIG_READ: cannot read {p}")))
        .collect::<Result<Vec<String>>>()?;

    let doc_refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(serde_json::Map::new());
    for (idx, raw) in yaml_docs.iter().enumerate() {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("CONFIG_INVALID: yaml layer {idx}"))?;
        let doc = serde_json::to_value(doc)
            .with_context(|| format!("CONFIG_INVALID: yaml layer {idx} is not representable as json"))?;
        merged = deep_merge(merged, doc);
    }

    enforce_no_secret_literals(&merged)?;

    // serde_json::Map is ordered by key, so serialisation is already canonical.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key-by-key; anything else (arrays included) is replaced.
fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

fn enforce_no_secret_literals(root: &Value) -> Result<()> {
    for ptr in leaf_pointers(root) {
        let literal = root
            .pointer(&ptr)
            .and_then(Value::as_str)
            .is_some_and(looks_like_secret);
        if literal {
            bail!("CONFIG_SECRET_DETECTED leaf={ptr} value=REDACTED");
        }
    }
    Ok(())
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim_start();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
