use chrono::{DateTime, Utc};
use tc_primitives::Decimal8;

/// Instance-wide decision policy. Per-bot fields (`decision_min_score`,
/// `risk_caps`) still take precedence where the spec says "most
/// restrictive of the two" — see `pipeline::effective_min_score`.
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionRuntimeConfig {
    pub decision_min_score: f64,
    pub decision_flip_score: f64,
    pub decision_flip_cooldown_min: i64,
    pub decision_max_flips_per_day: i32,
    pub decision_scalp_sl_offset_pct: f64,
    pub decision_scalp_tp_offset_pct: f64,
    pub decision_scalp_qty_multiplier: f64,
}

impl Default for DecisionRuntimeConfig {
    fn default() -> Self {
        Self {
            decision_min_score: 0.5,
            decision_flip_score: 0.75,
            decision_flip_cooldown_min: 30,
            decision_max_flips_per_day: 3,
            decision_scalp_sl_offset_pct: 0.0025,
            decision_scalp_tp_offset_pct: 0.0035,
            decision_scalp_qty_multiplier: 0.5,
        }
    }
}

/// A proposed open before any gating has been applied, built from the
/// signal's source. Step 1 of the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ProposedOpen {
    pub sl: Option<Decimal8>,
    pub tp: Option<Decimal8>,
    pub qty: Option<Decimal8>,
    pub score: f64,
}

/// Everything the pipeline needs about the world that isn't on the signal
/// or bot themselves. The caller (the daemon's signal handler) is
/// responsible for gathering these — the pipeline itself does no IO.
#[derive(Clone, Debug)]
pub struct DecisionContext {
    pub now: DateTime<Utc>,
    /// Pre-evaluated by `tc-risk`: psychology pause, allocation guard,
    /// market hours. `None` means allowed; `Some(reason)` is the ignore tag.
    pub risk_block: Option<String>,
    pub runtime: DecisionRuntimeConfig,
    pub hedging_enabled: bool,
    /// Net signed qty of existing open position(s) on `(broker_account,
    /// symbol)`: positive long, negative short, zero flat.
    pub net_position_qty: Decimal8,
    pub open_position_id: Option<uuid::Uuid>,
    pub bot_allows_opposite_scalp: bool,
    pub filled_orders_today: i32,
    pub max_trades_per_day: i32,
    pub minutes_since_last_open_decision: Option<i64>,
    pub trade_interval_minutes: i64,
    pub minutes_since_last_flip_close: Option<i64>,
    pub flips_today: i32,
}
