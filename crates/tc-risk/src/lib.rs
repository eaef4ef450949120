//! Psychology (loss-streak cooldowns, drawdown-scaled size multiplier) and
//! balance allocation guards. Deterministic, pure logic — no IO, no clock
//! reads beyond the `now` callers pass in.

mod allocation;
mod engine;
mod types;

pub use allocation::{bot_is_available_for_trading, roll_allocation_day};
pub use engine::{apply_pause, effective_thresholds, get_size_multiplier, update_bot_after_realized_pnl, EffectiveThresholds};
pub use types::{AllocationVerdict, GlobalRiskSettings, PsychologyUpdate, TradeOutcome};
