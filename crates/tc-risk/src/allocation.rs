//! Allocation guard: caps a bot's trading to a fixed slice of balance and
//! stops it once that slice's loss or profit cap is hit.

use chrono::{DateTime, Utc};
use tc_primitives::Decimal8;
use tc_schemas::{AllocationState, Bot};

use crate::types::AllocationVerdict;

/// Evaluate whether `bot` may trade right now. `market_open` reflects the
/// calendar check only — a broker-specific probe happens upstream of this
/// call. `broker_balance` and `lifetime_realized` are only consulted when
/// `allocation_amount > 0`. Mutates `bot.allocation` in place when a cap is
/// newly hit: `allocation_guard_tripped` latches `true` so a second call
/// this cycle (before `roll_allocation_day` resets it) sees `AlreadyStopped`
/// instead of re-evaluating and re-tripping the cap, the same
/// mutate-in-place shape `update_bot_after_realized_pnl` uses for the loss
/// streak.
pub fn bot_is_available_for_trading(
    bot: &mut Bot,
    now: DateTime<Utc>,
    market_open: bool,
    broker_balance: Decimal8,
    lifetime_realized: Decimal8,
) -> AllocationVerdict {
    if !bot.is_tradeable() {
        return AllocationVerdict::NotActive;
    }
    if bot.is_psychology_paused(now) {
        return AllocationVerdict::PsychologyPaused;
    }
    if !market_open {
        return AllocationVerdict::MarketClosed;
    }

    let alloc = bot.allocation.clone();
    if alloc.allocation_amount.is_zero() || alloc.allocation_amount.is_negative() {
        return AllocationVerdict::Tradeable;
    }

    if alloc.allocation_amount > broker_balance {
        if alloc.allocation_guard_tripped {
            return AllocationVerdict::AlreadyStopped;
        }
        bot.allocation.allocation_guard_tripped = true;
        return AllocationVerdict::Stop {
            journal_event: "allocation.balance_insufficient",
            new_allocation_start_pnl: None,
        };
    }

    let realized = lifetime_realized - alloc.allocation_start_pnl;
    let loss_cap = if alloc.allocation_loss_pct.is_positive() {
        alloc.allocation_amount.checked_mul(alloc.allocation_loss_pct).unwrap_or(alloc.allocation_amount) / Decimal8::from_int(100)
    } else {
        alloc.allocation_amount
    };
    let profit_cap = if alloc.allocation_profit_pct.is_positive() {
        Some(alloc.allocation_amount.checked_mul(alloc.allocation_profit_pct).unwrap_or(Decimal8::ZERO) / Decimal8::from_int(100))
    } else {
        None
    };

    let loss_breached = realized <= -loss_cap;
    let profit_breached = profit_cap.map(|cap| realized >= cap).unwrap_or(false);

    if loss_breached || profit_breached {
        if alloc.allocation_guard_tripped {
            return AllocationVerdict::AlreadyStopped;
        }
        let new_baseline = alloc.allocation_start_pnl + realized;
        bot.allocation.allocation_guard_tripped = true;
        bot.allocation.allocation_start_pnl = new_baseline;
        return AllocationVerdict::Stop {
            journal_event: "allocation.cap_hit",
            new_allocation_start_pnl: Some(new_baseline),
        };
    }

    AllocationVerdict::Tradeable
}

/// Reset the allocation cycle baseline on day rollover and clear the
/// guard-tripped idempotency flag so a new cycle can trip it again.
pub fn roll_allocation_day(alloc: &mut AllocationState, lifetime_realized: Decimal8, now: DateTime<Utc>) {
    alloc.allocation_start_pnl = lifetime_realized;
    alloc.allocation_started_at = Some(now);
    alloc.allocation_guard_tripped = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::{
        AllocationState, BotStatus, EngineMode, PsychologyState, RiskCaps, TradingWindow,
    };
    use uuid::Uuid;

    fn bot_with_allocation(alloc: AllocationState) -> Bot {
        Bot {
            id: Uuid::nil(),
            owner: "owner".into(),
            name: "test-bot".into(),
            asset_symbol: "EURUSD".into(),
            broker_account_id: Uuid::nil(),
            status: BotStatus::Active,
            auto_trade: true,
            engine_mode: EngineMode::Scalper,
            default_timeframe: "M5".into(),
            default_qty: Decimal8::from_f64(0.01),
            allowed_timeframes: vec!["M5".into()],
            enabled_strategies: vec![],
            decision_min_score: 0.5,
            risk_caps: RiskCaps { max_concurrent_positions: 1, max_trades_per_day: 10, trade_interval_minutes: 5 },
            trading_window: TradingWindow::always_on(),
            psychology: PsychologyState {
                current_loss_streak: 0,
                paused_until: None,
                max_loss_streak_before_pause: 0,
                loss_streak_cooldown_min: 0,
                soft_drawdown_limit_pct: Decimal8::ZERO,
                hard_drawdown_limit_pct: Decimal8::ZERO,
                soft_size_multiplier: Decimal8::from_int(1),
                hard_size_multiplier: Decimal8::from_int(1),
            },
            allocation: alloc,
            scalper_params: serde_json::Value::Null,
            last_htf_bias: None,
        }
    }

    #[test]
    fn zero_allocation_is_unbounded() {
        let mut bot = bot_with_allocation(AllocationState {
            allocation_amount: Decimal8::ZERO,
            allocation_profit_pct: Decimal8::ZERO,
            allocation_loss_pct: Decimal8::ZERO,
            allocation_start_pnl: Decimal8::ZERO,
            allocation_started_at: None,
            allocation_guard_tripped: false,
        });
        let verdict = bot_is_available_for_trading(&mut bot, Utc::now(), true, Decimal8::from_int(0), Decimal8::ZERO);
        assert_eq!(verdict, AllocationVerdict::Tradeable);
    }

    #[test]
    fn insufficient_balance_stops_bot() {
        let mut bot = bot_with_allocation(AllocationState {
            allocation_amount: Decimal8::from_int(1000),
            allocation_profit_pct: Decimal8::ZERO,
            allocation_loss_pct: Decimal8::ZERO,
            allocation_start_pnl: Decimal8::ZERO,
            allocation_started_at: None,
            allocation_guard_tripped: false,
        });
        let verdict = bot_is_available_for_trading(&mut bot, Utc::now(), true, Decimal8::from_int(500), Decimal8::ZERO);
        assert_eq!(
            verdict,
            AllocationVerdict::Stop { journal_event: "allocation.balance_insufficient", new_allocation_start_pnl: None }
        );
    }

    #[test]
    fn loss_cap_breach_stops_and_rebaselines() {
        let mut bot = bot_with_allocation(AllocationState {
            allocation_amount: Decimal8::from_int(1000),
            allocation_profit_pct: Decimal8::ZERO,
            allocation_loss_pct: Decimal8::from_int(10),
            allocation_start_pnl: Decimal8::ZERO,
            allocation_started_at: None,
            allocation_guard_tripped: false,
        });
        // loss_cap = 1000 * 10% = 100; realized = -150 breaches it.
        let verdict = bot_is_available_for_trading(&mut bot, Utc::now(), true, Decimal8::from_int(5000), Decimal8::from_int(-150));
        match verdict {
            AllocationVerdict::Stop { journal_event, new_allocation_start_pnl } => {
                assert_eq!(journal_event, "allocation.cap_hit");
                assert_eq!(new_allocation_start_pnl, Some(Decimal8::from_int(-150)));
            }
            other => panic!("expected Stop, got {other:?}"),
        }
        assert!(bot.allocation.allocation_guard_tripped);
    }

    #[test]
    fn tripped_guard_blocks_repeated_calls_until_day_roll() {
        let mut bot = bot_with_allocation(AllocationState {
            allocation_amount: Decimal8::from_int(1000),
            allocation_profit_pct: Decimal8::ZERO,
            allocation_loss_pct: Decimal8::from_int(10),
            allocation_start_pnl: Decimal8::ZERO,
            allocation_started_at: None,
            allocation_guard_tripped: false,
        });
        let now = Utc::now();
        let first = bot_is_available_for_trading(&mut bot, now, true, Decimal8::from_int(5000), Decimal8::from_int(-150));
        assert!(matches!(first, AllocationVerdict::Stop { .. }));
        assert!(bot.allocation.allocation_guard_tripped);

        let second = bot_is_available_for_trading(&mut bot, now, true, Decimal8::from_int(5000), Decimal8::from_int(-150));
        assert_eq!(second, AllocationVerdict::AlreadyStopped);

        roll_allocation_day(&mut bot.allocation, Decimal8::from_int(-150), now);
        assert!(!bot.allocation.allocation_guard_tripped);
        let third = bot_is_available_for_trading(&mut bot, now, true, Decimal8::from_int(5000), Decimal8::ZERO);
        assert_eq!(third, AllocationVerdict::Tradeable);
    }

    #[test]
    fn within_caps_is_tradeable() {
        let mut bot = bot_with_allocation(AllocationState {
            allocation_amount: Decimal8::from_int(1000),
            allocation_profit_pct: Decimal8::from_int(20),
            allocation_loss_pct: Decimal8::from_int(10),
            allocation_start_pnl: Decimal8::ZERO,
            allocation_started_at: None,
            allocation_guard_tripped: false,
        });
        let verdict = bot_is_available_for_trading(&mut bot, Utc::now(), true, Decimal8::from_int(5000), Decimal8::from_int(-20));
        assert_eq!(verdict, AllocationVerdict::Tradeable);
    }
}
