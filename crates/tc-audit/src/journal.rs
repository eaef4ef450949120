use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Append-only audit writer. Writes JSON Lines (one event per line).
/// Hash chain is always on: each event carries `hash_prev` + `hash_self` so a
/// tampered or truncated log is detectable without a separate signature store.
pub struct AuditWriter {
    path: PathBuf,
    last_hash: Option<String>,
    seq: u64,
}

impl AuditWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }
        Ok(Self { path, last_hash: None, seq: 0 })
    }

    /// Resume an existing log after a restart: restore chain tip and sequence
    /// counter together, never just one of the two.
    pub fn resume(path: impl AsRef<Path>, last_hash: Option<String>, seq: u64) -> Result<Self> {
        let mut w = Self::new(path)?;
        w.last_hash = last_hash;
        w.seq = seq;
        Ok(w)
    }

    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one event. `bot_id` is `None` for events not scoped to a single bot
    /// (e.g. a task-level failure touching many bots at once).
    pub fn append(
        &mut self,
        bot_id: Option<Uuid>,
        topic: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<AuditEvent> {
        let ts_utc = Utc::now();
        let event_id = derive_event_id(self.last_hash.as_deref(), &payload, self.seq)?;
        self.seq += 1;

        let mut ev = AuditEvent {
            event_id,
            bot_id,
            ts_utc,
            topic: topic.to_string(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: self.last_hash.clone(),
            hash_self: None,
        };

        let self_hash = compute_event_hash(&ev)?;
        ev.hash_self = Some(self_hash.clone());
        self.last_hash = Some(self_hash);

        let line = canonical_json_line(&ev)?;
        append_line(&self.path, &line)?;

        Ok(ev)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub bot_id: Option<Uuid>,
    pub ts_utc: DateTime<Utc>,
    pub topic: String,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Deterministic event id derived from chain state, payload and sequence —
/// no RNG, so a replayed log always reproduces the same ids.
fn derive_event_id(prev_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.unwrap_or("").as_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(canonical_json_line(payload)?.as_bytes());
    let digest = hasher.finalize();
    Ok(Uuid::new_v5(&Uuid::NAMESPACE_OID, &digest))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open audit log {:?}", path))?;
    f.write_all(line.as_bytes()).context("write audit line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize audit event failed")?;
    let sorted = sort_keys(&raw);
    serde_json::to_string(&sorted).context("json stringify failed")
}

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

/// Hash is computed over the canonical JSON of the event with `hash_self` cleared,
/// to avoid hashing a field that contains its own hash.
pub fn compute_event_hash(ev: &AuditEvent) -> Result<String> {
    let mut clone = ev.clone();
    clone.hash_self = None;
    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut line_count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let ev: AuditEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parse audit event at line {}", i + 1))?;
        line_count += 1;

        if ev.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!("hash_prev mismatch: expected {:?}, got {:?}", prev_hash, ev.hash_prev),
            });
        }

        if let Some(ref claimed_hash) = ev.hash_self {
            let recomputed = compute_event_hash(&ev)?;
            if *claimed_hash != recomputed {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!("hash_self mismatch: claimed {}, recomputed {}", claimed_hash, recomputed),
                });
            }
        }

        prev_hash = ev.hash_self.clone();
    }

    Ok(VerifyResult::Valid { lines: line_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn untampered_chain_verifies_valid() {
        let path = std::env::temp_dir().join(format!("tc_audit_test_{}_untampered", Uuid::new_v4().as_simple()));
        let bot_id = Uuid::new_v4();
        {
            let mut w = AuditWriter::new(&path).unwrap();
            for i in 0..5 {
                w.append(Some(bot_id), "AUDIT", "TEST_EVENT", json!({"index": i})).unwrap();
            }
        }
        assert_eq!(verify_hash_chain(&path).unwrap(), VerifyResult::Valid { lines: 5 });
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn tampered_payload_is_detected() {
        let path = std::env::temp_dir().join(format!("tc_audit_test_{}_tampered", Uuid::new_v4().as_simple()));
        let bot_id = Uuid::new_v4();
        {
            let mut w = AuditWriter::new(&path).unwrap();
            for i in 0..5 {
                w.append(Some(bot_id), "AUDIT", "TEST_EVENT", json!({"index": i})).unwrap();
            }
        }
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = content.lines().collect();
        let mut ev: Value = serde_json::from_str(lines[2]).unwrap();
        ev["payload"]["index"] = json!(999);
        let tampered = serde_json::to_string(&ev).unwrap();
        lines[2] = &tampered;
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();

        match verify_hash_chain(&path).unwrap() {
            VerifyResult::Broken { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("hash_self mismatch"));
            }
            VerifyResult::Valid { .. } => panic!("tampered chain should not verify"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn deleted_line_breaks_the_chain() {
        let path = std::env::temp_dir().join(format!("tc_audit_test_{}_deleted", Uuid::new_v4().as_simple()));
        let bot_id = Uuid::new_v4();
        {
            let mut w = AuditWriter::new(&path).unwrap();
            for i in 0..5 {
                w.append(Some(bot_id), "AUDIT", "TEST_EVENT", json!({"index": i})).unwrap();
            }
        }
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().enumerate().filter(|(i, _)| *i != 2).map(|(_, l)| l).collect();
        std::fs::write(&path, lines.join("\n") + "\n").unwrap();

        match verify_hash_chain(&path).unwrap() {
            VerifyResult::Broken { reason, .. } => assert!(reason.contains("hash_prev mismatch")),
            VerifyResult::Valid { .. } => panic!("chain with a deleted line should not verify"),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_log_is_valid() {
        let path = std::env::temp_dir().join(format!("tc_audit_test_{}_empty", Uuid::new_v4().as_simple()));
        std::fs::write(&path, "").unwrap();
        assert_eq!(verify_hash_chain(&path).unwrap(), VerifyResult::Valid { lines: 0 });
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn resume_continues_the_chain_from_the_saved_tip() {
        let path = std::env::temp_dir().join(format!("tc_audit_test_{}_resume", Uuid::new_v4().as_simple()));
        let bot_id = Uuid::new_v4();
        let (tip, seq) = {
            let mut w = AuditWriter::new(&path).unwrap();
            w.append(Some(bot_id), "AUDIT", "FIRST", json!({})).unwrap();
            (w.last_hash(), w.seq())
        };
        {
            let mut w = AuditWriter::resume(&path, tip, seq).unwrap();
            w.append(Some(bot_id), "AUDIT", "SECOND", json!({})).unwrap();
        }
        assert_eq!(verify_hash_chain(&path).unwrap(), VerifyResult::Valid { lines: 2 });
        let _ = std::fs::remove_file(&path);
    }
}
