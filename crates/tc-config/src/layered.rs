//! Layered YAML config loading: later files deep-merge over earlier ones,
//! then the merged document is canonicalized (keys sorted recursively) and
//! hashed so two engines loading the same effective config agree on a
//! fingerprint without agreeing on file layout.

use std::fs;

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load and deep-merge YAML files in order, then canonicalize and hash.
/// Each path overrides keys set by the ones before it.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for path in paths {
        let raw = fs::read_to_string(path).with_context(|| format!("read config: {path}"))?;
        let yaml_val: serde_yaml::Value = serde_yaml::from_str(&raw).with_context(|| format!("parse yaml: {path}"))?;
        let json_val = serde_json::to_value(yaml_val).with_context(|| format!("yaml->json conversion failed for {path}"))?;
        deep_merge(&mut merged, json_val);
    }

    merge_into_loaded(merged)
}

/// Same merge/canonicalize/hash pipeline, starting from in-memory layers
/// rather than files on disk — used by the per-bot scalper-profile merge
/// and by tests.
pub fn merge_layers(layers: Vec<Value>) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merge_into_loaded(merged)
}

fn merge_into_loaded(merged: Value) -> Result<LoadedConfig> {
    let canonical = canonicalize_json(&merged);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json re-parse failed")?,
        canonical_json: canonical,
        config_hash,
    })
}

/// Objects merge recursively; arrays and scalars are replaced wholesale by
/// the later layer.
fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn canonicalize_json(v: &Value) -> String {
    let sorted = sort_keys(v);
    serde_json::to_string(&sorted).expect("canonical json serialization must not fail")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for k in keys {
                sorted.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_layer_overrides_earlier_scalar() {
        let loaded = merge_layers(vec![json!({"risk": {"max_concurrent": 3}}), json!({"risk": {"max_concurrent": 5}})]).unwrap();
        assert_eq!(loaded.config_json["risk"]["max_concurrent"], 5);
    }

    #[test]
    fn sibling_keys_from_different_layers_both_survive() {
        let loaded = merge_layers(vec![json!({"risk": {"max_concurrent": 3}}), json!({"risk": {"decision_min_score": 0.6}})]).unwrap();
        assert_eq!(loaded.config_json["risk"]["max_concurrent"], 3);
        assert_eq!(loaded.config_json["risk"]["decision_min_score"], 0.6);
    }

    #[test]
    fn hash_is_stable_across_key_insertion_order() {
        let a = merge_layers(vec![json!({"b": 1, "a": 2})]).unwrap();
        let b = merge_layers(vec![json!({"a": 2, "b": 1})]).unwrap();
        assert_eq!(a.config_hash, b.config_hash);
    }

    #[test]
    fn array_is_replaced_not_merged() {
        let loaded = merge_layers(vec![json!({"symbols": ["EURUSD", "GBPUSD"]}), json!({"symbols": ["XAUUSD"]})]).unwrap();
        assert_eq!(loaded.config_json["symbols"], json!(["XAUUSD"]));
    }
}
