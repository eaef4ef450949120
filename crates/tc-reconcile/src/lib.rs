//! Reconciliation between the local ledger and the broker's live state.
//! Backs the operator-triggered `reconcile_trades` command; the
//! automatic per-tick reconcile-close guard lives in `tc-monitor`.

pub mod engine;
pub mod types;
pub mod watermark;

pub use engine::{is_clean_reconcile, reconcile, reconcile_monotonic, StaleBrokerSnapshot};
pub use types::{BrokerSnapshot, LocalSnapshot, OrderSnapshot, ReconcileAction, ReconcileDiff, ReconcileReason, ReconcileReport};
pub use watermark::{SnapshotFreshness, SnapshotWatermark};
