use tc_primitives::Decimal8;

/// Instance-wide risk settings an operator sets once; every bot's own
/// `PsychologyState` is compared against these and the more conservative
/// value wins. Zero means "not configured" for every threshold field.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalRiskSettings {
    pub max_loss_streak_before_pause: i32,
    pub loss_streak_cooldown_min: i64,
    pub soft_drawdown_limit_pct: Decimal8,
    pub hard_drawdown_limit_pct: Decimal8,
    pub soft_size_multiplier: Decimal8,
    pub hard_size_multiplier: Decimal8,
}

impl GlobalRiskSettings {
    pub fn unset() -> Self {
        Self {
            max_loss_streak_before_pause: 0,
            loss_streak_cooldown_min: 0,
            soft_drawdown_limit_pct: Decimal8::ZERO,
            hard_drawdown_limit_pct: Decimal8::ZERO,
            soft_size_multiplier: Decimal8::from_int(1),
            hard_size_multiplier: Decimal8::from_int(1),
        }
    }
}

/// The realized outcome of a closed trade, used to advance the loss streak.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

impl TradeOutcome {
    pub fn from_pnl(pnl: Decimal8) -> Self {
        if pnl.is_positive() {
            TradeOutcome::Win
        } else if pnl.is_negative() {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Breakeven
        }
    }
}

/// Outcome of `update_bot_after_realized_pnl`: the streak change plus
/// whether the bot should now be paused.
#[derive(Clone, Debug, PartialEq)]
pub struct PsychologyUpdate {
    pub new_loss_streak: i32,
    pub should_pause: bool,
    pub paused_until: Option<chrono::DateTime<chrono::Utc>>,
}

/// Result of the allocation guard. `Stop` carries the journal event name
/// the caller must emit and, when a cap was hit, the rebaselined
/// `allocation_start_pnl` to persist.
#[derive(Clone, Debug, PartialEq)]
pub enum AllocationVerdict {
    Tradeable,
    NotActive,
    PsychologyPaused,
    MarketClosed,
    Stop {
        journal_event: &'static str,
        new_allocation_start_pnl: Option<Decimal8>,
    },
    /// The guard already tripped this cycle; nothing new to journal.
    AlreadyStopped,
}
