use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotStatus {
    Active,
    Paused,
    Stopped,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    External,
    Harami,
    Scalper,
}

/// The weekly trading window a bot is allowed to open new positions in.
/// Closing/monitoring logic ignores this — it only gates new entries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub enabled: bool,
    pub days: Vec<Weekday>,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn always_on() -> Self {
        Self {
            enabled: false,
            days: Vec::new(),
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
        }
    }

    /// Whether `now` (already converted to the bot's trading timezone by the
    /// caller) falls inside this window. A disabled window always permits.
    pub fn permits(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        if !self.days.is_empty() && !self.days.contains(&now.weekday()) {
            return false;
        }
        let t = now.time();
        if self.start <= self.end {
            t >= self.start && t <= self.end
        } else {
            // window wraps midnight
            t >= self.start || t <= self.end
        }
    }
}

/// Loss-streak and drawdown behavior for a bot. Mutable fields
/// (`current_loss_streak`, `paused_until`) are updated by `tc-risk` as
/// outcomes are recorded; the rest are operator-set limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PsychologyState {
    pub current_loss_streak: i32,
    pub paused_until: Option<DateTime<Utc>>,
    pub max_loss_streak_before_pause: i32,
    pub loss_streak_cooldown_min: i64,
    pub soft_drawdown_limit_pct: Decimal8,
    pub hard_drawdown_limit_pct: Decimal8,
    pub soft_size_multiplier: Decimal8,
    pub hard_size_multiplier: Decimal8,
}

/// Balance-based allocation cap. `allocation_start_pnl`/`allocation_started_at`
/// mark the baseline a cap-hit rebaselines from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationState {
    pub allocation_amount: Decimal8,
    pub allocation_profit_pct: Decimal8,
    pub allocation_loss_pct: Decimal8,
    pub allocation_start_pnl: Decimal8,
    pub allocation_started_at: Option<DateTime<Utc>>,
    /// Set once a cap-hit has stopped the bot for the current cycle, so a
    /// re-evaluation against the same frozen baseline doesn't re-journal.
    /// Cleared on the next day rollover.
    pub allocation_guard_tripped: bool,
}

/// Risk caps applied before a decision is allowed to open.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskCaps {
    pub max_concurrent_positions: i32,
    pub max_trades_per_day: i32,
    pub trade_interval_minutes: i64,
}

/// A configured trading bot: one asset, one broker account, one strategy
/// selection, wrapped in risk/psychology/allocation guards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: uuid::Uuid,
    pub owner: String,
    pub name: String,
    pub asset_symbol: String,
    pub broker_account_id: uuid::Uuid,
    pub status: BotStatus,
    pub auto_trade: bool,
    pub engine_mode: EngineMode,
    pub default_timeframe: String,
    pub default_qty: Decimal8,
    pub allowed_timeframes: Vec<String>,
    pub enabled_strategies: Vec<String>,
    pub decision_min_score: f64,
    pub risk_caps: RiskCaps,
    pub trading_window: TradingWindow,
    pub psychology: PsychologyState,
    pub allocation: AllocationState,
    pub scalper_params: serde_json::Value,
    pub last_htf_bias: Option<String>,
}

impl Bot {
    pub fn is_tradeable(&self) -> bool {
        self.status == BotStatus::Active && self.auto_trade
    }

    pub fn is_psychology_paused(&self, now: DateTime<Utc>) -> bool {
        matches!(self.psychology.paused_until, Some(until) if now < until)
    }
}
