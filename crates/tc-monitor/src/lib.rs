//! Periodic execution-monitor tasks: per-position early exit/trailing/
//! kill-switch policy, stale-order cancellation, broker reconcile for
//! untracked live positions, and the market-hours guard. Every function
//! here is a pure evaluate-then-apply step over a caller-supplied
//! snapshot — scheduling (the ~15s/~60s cadences) lives outside this
//! crate, in `tc-daemon`.

pub mod market_guard;
pub mod position_policy;
pub mod reconcile_guard;
pub mod stale_orders;

pub use market_guard::{apply_market_guard, GuardAction};
pub use position_policy::{evaluate_tick, TickAction, TickInputs};
pub use reconcile_guard::{symbols_needing_reconcile_close, LiveBrokerPosition, RecentOrderOnSymbol, RECONCILE_GRACE};
pub use stale_orders::{cancel_if_stale, is_stale, STALE_CANCEL_REASON};
