//! Fill accounting: weighted-average position tracking, realized-PnL
//! attribution, and the psychology-update dispatch that follows a
//! realized close.

pub mod accounting;
pub mod pipeline;

pub use accounting::{apply_fill, realized_trade_log, replay_fills, trade_log_status_for_pnl, FillOutcome, ReplaySummary};
pub use pipeline::{process_fill, FillResult};
