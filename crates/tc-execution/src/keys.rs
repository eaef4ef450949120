//! Deterministic `client_order_id` derivation. Resubmitting the same
//! decision (or closing the same position) twice must produce the exact
//! same key — that's what lets the orchestrator upsert instead of duplicate.

use sha2::{Digest, Sha256};

fn truncated_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(digest)[..20].to_string()
}

/// Open-order key: unique per `(decision, account, symbol, action)`.
pub fn open_order_key(decision_id: &uuid::Uuid, account_id: &uuid::Uuid, symbol: &str, action: &str) -> String {
    truncated_hex(&format!("{decision_id}|{account_id}|{symbol}|{action}"))
}

/// Close-order key: unique per `(position, account, symbol)`, prefixed so
/// [`tc_schemas::Order::is_close`] can recognize it without a DB lookup.
pub fn close_order_key(position_id: &uuid::Uuid, account_id: &uuid::Uuid, symbol: &str) -> String {
    format!("close|{}", truncated_hex(&format!("close|{position_id}|{account_id}|{symbol}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_the_same_key() {
        let d = uuid::Uuid::new_v4();
        let a = uuid::Uuid::new_v4();
        assert_eq!(open_order_key(&d, &a, "EURUSD", "open"), open_order_key(&d, &a, "EURUSD", "open"));
    }

    #[test]
    fn close_key_carries_the_close_prefix() {
        let p = uuid::Uuid::new_v4();
        let a = uuid::Uuid::new_v4();
        let key = close_order_key(&p, &a, "EURUSD");
        assert!(key.starts_with("close|"));
    }

    #[test]
    fn different_symbols_produce_different_keys() {
        let d = uuid::Uuid::new_v4();
        let a = uuid::Uuid::new_v4();
        assert_ne!(open_order_key(&d, &a, "EURUSD", "open"), open_order_key(&d, &a, "GBPUSD", "open"));
    }
}
