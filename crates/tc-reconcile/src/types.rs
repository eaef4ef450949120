//! Minimal snapshot shapes reconciliation compares — deliberately decoupled
//! from the full `Order`/`Position` rows so a snapshot can be built from
//! whatever the local DB or the broker happens to expose, without pulling
//! in every column.

use std::collections::BTreeMap;

use tc_primitives::Decimal8;
use tc_schemas::{OrderSide, OrderStatus};

#[derive(Clone, Debug, PartialEq)]
pub struct OrderSnapshot {
    pub order_id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub qty: Decimal8,
    pub status: OrderStatus,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct LocalSnapshot {
    pub orders: BTreeMap<String, OrderSnapshot>,
    pub positions: BTreeMap<String, Decimal8>,
}

impl LocalSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrokerSnapshot {
    pub orders: BTreeMap<String, OrderSnapshot>,
    pub positions: BTreeMap<String, Decimal8>,
    /// Epoch milliseconds the snapshot was fetched at. Zero means "no
    /// timestamp" and is always rejected by the watermark.
    pub fetched_at_ms: i64,
}

impl BrokerSnapshot {
    pub fn empty(fetched_at_ms: i64) -> Self {
        Self { orders: BTreeMap::new(), positions: BTreeMap::new(), fetched_at_ms }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReconcileReason {
    UnknownBrokerOrder,
    PositionMismatch,
    OrderDrift,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileDiff {
    UnknownOrder { order_id: String },
    PositionQtyMismatch { symbol: String, local_qty: Decimal8, broker_qty: Decimal8 },
    OrderMismatch { order_id: String, field: &'static str, local: String, broker: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileAction {
    Clean,
    Halt,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileReport {
    pub action: ReconcileAction,
    pub reasons: Vec<ReconcileReason>,
    pub diffs: Vec<ReconcileDiff>,
}

impl ReconcileReport {
    pub fn clean() -> Self {
        Self { action: ReconcileAction::Clean, reasons: Vec::new(), diffs: Vec::new() }
    }

    pub fn is_clean(&self) -> bool {
        self.action == ReconcileAction::Clean
    }
}
