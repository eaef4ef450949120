//! Candle-replay harness behind the `backtest_engine` operator command. It
//! drives the same [`tc_strategy::arbitrate`] arbitrator the live engine
//! uses against a CSV of historical bars — a tuning aid for `min_score`
//! and `warmup`, not a portfolio backtester (no slippage model, no
//! corporate actions, no stress scenarios).

pub mod engine;
pub mod loader;

pub use engine::{run_backtest, summarise, BacktestConfig, BacktestSummary, ExitReason, TradeResult};
pub use loader::{load_csv_file, parse_csv_bars, LoadError};

/// Default `min_score` when the caller doesn't pin one explicitly — the
/// same instance-wide floor the live decision pipeline falls back to.
pub fn default_min_score() -> f64 {
    tc_decision::DecisionRuntimeConfig::default().decision_min_score
}
