//! Deterministic diff between what the local database believes and what
//! the broker reports: an unknown broker order, any order-field drift, or
//! any position quantity mismatch all halt rather than silently paper
//! over a discrepancy.

use std::collections::BTreeSet;

use tc_primitives::Decimal8;

use crate::types::{BrokerSnapshot, LocalSnapshot, OrderSnapshot, ReconcileAction, ReconcileDiff, ReconcileReason, ReconcileReport};
use crate::watermark::{SnapshotFreshness, SnapshotWatermark};

fn push_reason_once(reasons: &mut Vec<ReconcileReason>, r: ReconcileReason) {
    if !reasons.contains(&r) {
        reasons.push(r);
    }
}

fn compare_orders(order_id: &str, local: &OrderSnapshot, broker: &OrderSnapshot, diffs: &mut Vec<ReconcileDiff>, reasons: &mut Vec<ReconcileReason>) {
    let mut mismatch = |field: &'static str, local_v: String, broker_v: String| {
        diffs.push(ReconcileDiff::OrderMismatch { order_id: order_id.to_string(), field, local: local_v, broker: broker_v });
        push_reason_once(reasons, ReconcileReason::OrderDrift);
    };

    if local.symbol != broker.symbol {
        mismatch("symbol", local.symbol.clone(), broker.symbol.clone());
    }
    if local.side != broker.side {
        mismatch("side", format!("{:?}", local.side), format!("{:?}", broker.side));
    }
    if local.qty != broker.qty {
        mismatch("qty", local.qty.to_string(), broker.qty.to_string());
    }
    if local.status != broker.status {
        mismatch("status", format!("{:?}", local.status), format!("{:?}", broker.status));
    }
}

/// Pure content comparison. Use [`reconcile_monotonic`] in production —
/// this is for tests and call sites that already enforce freshness.
pub fn reconcile(local: &LocalSnapshot, broker: &BrokerSnapshot) -> ReconcileReport {
    let mut reasons = Vec::new();
    let mut diffs = Vec::new();

    for order_id in broker.orders.keys() {
        if !local.orders.contains_key(order_id) {
            diffs.push(ReconcileDiff::UnknownOrder { order_id: order_id.clone() });
            push_reason_once(&mut reasons, ReconcileReason::UnknownBrokerOrder);
        }
    }

    for (order_id, local_ord) in &local.orders {
        if let Some(broker_ord) = broker.orders.get(order_id) {
            compare_orders(order_id, local_ord, broker_ord, &mut diffs, &mut reasons);
        }
    }

    let symbols: BTreeSet<&String> = local.positions.keys().chain(broker.positions.keys()).collect();
    for symbol in symbols {
        let lq = local.positions.get(symbol).copied().unwrap_or(Decimal8::ZERO);
        let bq = broker.positions.get(symbol).copied().unwrap_or(Decimal8::ZERO);
        if lq != bq {
            diffs.push(ReconcileDiff::PositionQtyMismatch { symbol: symbol.clone(), local_qty: lq, broker_qty: bq });
            push_reason_once(&mut reasons, ReconcileReason::PositionMismatch);
        }
    }

    reasons.sort();

    if reasons.is_empty() {
        ReconcileReport::clean()
    } else {
        ReconcileReport { action: ReconcileAction::Halt, reasons, diffs }
    }
}

pub fn is_clean_reconcile(local: &LocalSnapshot, broker: &BrokerSnapshot) -> bool {
    reconcile(local, broker).is_clean()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleBrokerSnapshot {
    pub freshness: SnapshotFreshness,
}

impl std::fmt::Display for StaleBrokerSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.freshness {
            SnapshotFreshness::Stale { watermark_ms, got_ms } => {
                write!(f, "stale broker snapshot rejected: watermark={watermark_ms}ms got={got_ms}ms")
            }
            SnapshotFreshness::NoTimestamp => write!(f, "broker snapshot has no timestamp: rejected"),
            SnapshotFreshness::Fresh => write!(f, "StaleBrokerSnapshot constructed with Fresh"),
        }
    }
}

impl std::error::Error for StaleBrokerSnapshot {}

/// The required production path: rejects a broker snapshot that fails the
/// monotonicity watermark before any content comparison runs.
pub fn reconcile_monotonic(wm: &mut SnapshotWatermark, local: &LocalSnapshot, broker: &BrokerSnapshot) -> Result<ReconcileReport, StaleBrokerSnapshot> {
    let freshness = wm.accept(broker);
    if freshness.is_rejected() {
        return Err(StaleBrokerSnapshot { freshness });
    }
    Ok(reconcile(local, broker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_primitives::Decimal8;
    use tc_schemas::{OrderSide, OrderStatus};

    fn order(symbol: &str, qty: f64) -> OrderSnapshot {
        OrderSnapshot { order_id: "o1".into(), symbol: symbol.into(), side: OrderSide::Buy, qty: Decimal8::from_f64(qty), status: OrderStatus::Ack }
    }

    #[test]
    fn matching_snapshots_are_clean() {
        let mut local = LocalSnapshot::empty();
        local.orders.insert("o1".into(), order("EURUSD", 0.1));
        local.positions.insert("EURUSD".into(), Decimal8::from_f64(0.1));
        let mut broker = BrokerSnapshot::empty(1);
        broker.orders.insert("o1".into(), order("EURUSD", 0.1));
        broker.positions.insert("EURUSD".into(), Decimal8::from_f64(0.1));
        assert!(reconcile(&local, &broker).is_clean());
    }

    #[test]
    fn unknown_broker_order_halts() {
        let local = LocalSnapshot::empty();
        let mut broker = BrokerSnapshot::empty(1);
        broker.orders.insert("o1".into(), order("EURUSD", 0.1));
        let report = reconcile(&local, &broker);
        assert_eq!(report.action, ReconcileAction::Halt);
        assert!(report.reasons.contains(&ReconcileReason::UnknownBrokerOrder));
    }

    #[test]
    fn position_qty_mismatch_halts() {
        let mut local = LocalSnapshot::empty();
        local.positions.insert("EURUSD".into(), Decimal8::from_f64(0.1));
        let mut broker = BrokerSnapshot::empty(1);
        broker.positions.insert("EURUSD".into(), Decimal8::from_f64(0.2));
        let report = reconcile(&local, &broker);
        assert!(report.reasons.contains(&ReconcileReason::PositionMismatch));
    }

    #[test]
    fn stale_snapshot_is_rejected_before_comparison() {
        let mut wm = SnapshotWatermark::new();
        wm.accept(&BrokerSnapshot::empty(1000));
        let local = LocalSnapshot::empty();
        let stale = BrokerSnapshot::empty(500);
        assert!(reconcile_monotonic(&mut wm, &local, &stale).is_err());
    }
}
