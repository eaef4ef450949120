pub mod events;
pub mod journal;

pub use journal::{compute_event_hash, verify_hash_chain, verify_hash_chain_str, AuditEvent, AuditWriter, VerifyResult};
