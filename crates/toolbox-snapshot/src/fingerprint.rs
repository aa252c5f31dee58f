//! Deterministic schema fingerprints.
//!
//! A fingerprint is the BLAKE3 digest of a canonical JSON rendering: object
//! keys sorted at every depth, array order preserved, and the volatile keys
//! in [`VOLATILE_KEYS`] removed. Two introspections of an unchanged server
//! therefore fingerprint identically even when taken at different times.

use mcp_toolbox_core::{Error, Result};
use mcp_toolbox_introspector::Snapshot;
use serde_json::{Map, Value, json};

/// Keys dropped from every object before hashing.
pub const VOLATILE_KEYS: &[&str] = &["retrievedAt", "timestamp"];

/// Returns a copy of `value` with sorted keys and no volatile fields.
#[must_use]
pub fn normalize_for_hash(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(normalize_for_hash).collect()),
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .keys()
                .filter(|key| !VOLATILE_KEYS.contains(&key.as_str()))
                .collect();
            keys.sort();

            let mut out = Map::with_capacity(keys.len());
            for key in keys {
                out.insert(key.clone(), normalize_for_hash(&map[key.as_str()]));
            }
            Value::Object(out)
        }
        primitive => primitive.clone(),
    }
}

/// Compact canonical JSON of `value`.
#[must_use]
pub fn stable_stringify(value: &Value) -> String {
    normalize_for_hash(value).to_string()
}

/// Lowercase hex digest of the canonical form of `value`.
///
/// # Examples
///
/// ```
/// use mcp_toolbox_snapshot::fingerprint;
/// use serde_json::json;
///
/// assert_eq!(fingerprint(&json!({"b": 2, "a": 1})), fingerprint(&json!({"a": 1, "b": 2})));
/// assert_eq!(
///     fingerprint(&json!({"a": 1, "retrievedAt": "2025-01-01T00:00:00.000Z"})),
///     fingerprint(&json!({"a": 1})),
/// );
/// assert_ne!(fingerprint(&json!([1, 2])), fingerprint(&json!([2, 1])));
/// ```
#[must_use]
pub fn fingerprint(value: &Value) -> String {
    blake3::hash(stable_stringify(value).as_bytes())
        .to_hex()
        .to_string()
}

/// Fingerprint of a snapshot's schema: server name, version and tools.
///
/// # Errors
///
/// Returns [`Error::SerializationError`] if the tools cannot be serialized.
pub fn schema_fingerprint(snapshot: &Snapshot) -> Result<String> {
    let tools = serde_json::to_value(&snapshot.tools).map_err(|e| Error::SerializationError {
        message: format!("failed to serialize tools of '{}'", snapshot.server_name),
        source: Some(e),
    })?;
    Ok(fingerprint(&json!({
        "serverName": snapshot.server_name,
        "version": snapshot.version,
        "tools": tools,
    })))
}
