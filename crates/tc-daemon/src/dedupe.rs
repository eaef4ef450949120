//! Alert dedupe-key derivation: the caller-supplied key wins; otherwise an
//! HMAC-SHA256 over the canonical payload when a secret is configured, else
//! a plain SHA-256 — giving every alert a stable `Signal.dedupe_key` even
//! when the source doesn't provide one.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::auth::hmac_sha256_hex;

/// Sort object keys recursively so the same payload always serializes the
/// same way regardless of the sender's field order.
pub fn canonical_json(v: &Value) -> String {
    fn sort_keys(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<_> = map.keys().cloned().collect();
                keys.sort();
                let mut new = serde_json::Map::new();
                for k in keys {
                    new.insert(k.clone(), sort_keys(&map[&k]));
                }
                Value::Object(new)
            }
            Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
            _ => v.clone(),
        }
    }
    serde_json::to_string(&sort_keys(v)).expect("Value serialization never fails")
}

pub fn compute_dedupe_key(provided: Option<&str>, canonical_payload: &str, hmac_secret: Option<&str>) -> String {
    if let Some(key) = provided {
        if !key.trim().is_empty() {
            return key.to_string();
        }
    }

    match hmac_secret {
        Some(secret) => hmac_sha256_hex(secret.as_bytes(), canonical_payload.as_bytes()),
        None => {
            let mut hasher = Sha256::new();
            hasher.update(canonical_payload.as_bytes());
            hex::encode(hasher.finalize())
        }
    }
}
