//! Market-hours guard: auto-stops a bot whose market just closed, and
//! auto-resumes it when the market reopens, using a reversible flag
//! stashed in `scalper_params` so the operator's own `status` choice isn't
//! clobbered — only a guard-initiated stop is ever auto-reversed. Never
//! acts on crypto, which trades 24/7 by definition.

use chrono::{DateTime, Utc};
use tc_schemas::{AssetCategory, Bot, BotStatus};
use tc_scalper::{market_status, CalendarSpec};

const GUARD_KEY: &str = "_market_guard";
const WAS_KEY: &str = "was";

fn guard_was_active(bot: &Bot) -> bool {
    bot.scalper_params.get(GUARD_KEY).and_then(|v| v.get(WAS_KEY)).and_then(|v| v.as_str()) == Some("active")
}

fn set_guard_was_active(bot: &mut Bot, active: bool) {
    let obj = bot.scalper_params.as_object_mut().expect("scalper_params must be a JSON object");
    if active {
        obj.insert(GUARD_KEY.to_string(), serde_json::json!({ WAS_KEY: "active" }));
    } else {
        obj.remove(GUARD_KEY);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GuardAction {
    None,
    AutoStopped,
    AutoResumed,
}

/// Evaluate and apply the market guard for one bot. Mutates `bot.status`
/// and `bot.scalper_params` in place.
pub fn apply_market_guard(bot: &mut Bot, category: AssetCategory, now: DateTime<Utc>) -> GuardAction {
    if category == AssetCategory::Crypto {
        return GuardAction::None;
    }

    let status = market_status(CalendarSpec::for_category(category), now);

    if !status.is_open() {
        if bot.status == BotStatus::Active {
            bot.status = BotStatus::Stopped;
            set_guard_was_active(bot, true);
            return GuardAction::AutoStopped;
        }
        return GuardAction::None;
    }

    if guard_was_active(bot) && bot.status == BotStatus::Stopped {
        bot.status = BotStatus::Active;
        set_guard_was_active(bot, false);
        return GuardAction::AutoResumed;
    }

    GuardAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tc_primitives::Decimal8;
    use tc_schemas::{AllocationState, EngineMode, PsychologyState, RiskCaps, TradingWindow};
    use uuid::Uuid;

    fn bot(status: BotStatus) -> Bot {
        Bot {
            id: Uuid::new_v4(),
            owner: "op".into(),
            name: "b".into(),
            asset_symbol: "EURUSD".into(),
            broker_account_id: Uuid::new_v4(),
            status,
            auto_trade: true,
            engine_mode: EngineMode::External,
            default_timeframe: "M15".into(),
            default_qty: Decimal8::from_f64(0.1),
            allowed_timeframes: vec![],
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
            allocation: AllocationState {
                allocation_amount: Decimal8::ZERO,
                allocation_profit_pct: Decimal8::ZERO,
                allocation_loss_pct: Decimal8::ZERO,
                allocation_start_pnl: Decimal8::ZERO,
                allocation_started_at: None,
                allocation_guard_tripped: false,
            },
            scalper_params: serde_json::json!({}),
            last_htf_bias: None,
        }
    }

    fn saturday_noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 8, 12, 0, 0).unwrap()
    }

    fn monday_noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn active_bot_is_auto_stopped_when_market_closes() {
        let mut b = bot(BotStatus::Active);
        let action = apply_market_guard(&mut b, AssetCategory::Forex, saturday_noon_utc());
        assert_eq!(action, GuardAction::AutoStopped);
        assert_eq!(b.status, BotStatus::Stopped);
    }

    #[test]
    fn guard_stopped_bot_resumes_when_market_reopens() {
        let mut b = bot(BotStatus::Active);
        apply_market_guard(&mut b, AssetCategory::Forex, saturday_noon_utc());
        let action = apply_market_guard(&mut b, AssetCategory::Forex, monday_noon_utc());
        assert_eq!(action, GuardAction::AutoResumed);
        assert_eq!(b.status, BotStatus::Active);
    }

    #[test]
    fn operator_stopped_bot_is_never_auto_resumed() {
        let mut b = bot(BotStatus::Stopped);
        let action = apply_market_guard(&mut b, AssetCategory::Forex, monday_noon_utc());
        assert_eq!(action, GuardAction::None);
        assert_eq!(b.status, BotStatus::Stopped);
    }

    #[test]
    fn crypto_is_never_touched() {
        let mut b = bot(BotStatus::Active);
        let action = apply_market_guard(&mut b, AssetCategory::Crypto, saturday_noon_utc());
        assert_eq!(action, GuardAction::None);
        assert_eq!(b.status, BotStatus::Active);
    }
}
