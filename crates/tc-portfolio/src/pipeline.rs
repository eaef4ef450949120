//! Glue between a raw fill and the rest of the system: apply the fill to
//! the position, record the execution and trade log, and — when the fill
//! realized PnL — dispatch the psychology update so loss streaks and
//! drawdown-scaled sizing react within the same cycle.

use chrono::{DateTime, Utc};
use tc_primitives::Decimal8;
use tc_risk::{update_bot_after_realized_pnl, GlobalRiskSettings, PsychologyUpdate};
use tc_schemas::{Bot, Execution, Order, Position, TradeLog};

use crate::accounting::{apply_fill, realized_trade_log};

pub struct FillResult {
    pub execution: Execution,
    pub trade_log: TradeLog,
    pub realized_pnl: Option<Decimal8>,
    pub psychology_update: Option<PsychologyUpdate>,
}

/// Apply one fill end to end: accounting, trade-log outcome row, and — only
/// when the fill realized PnL — the psychology streak/pause update on `bot`.
pub fn process_fill(
    bot: &mut Bot,
    global_risk: &GlobalRiskSettings,
    position: &mut Position,
    order: &Order,
    qty: Decimal8,
    price: Decimal8,
    fee: Decimal8,
    now: DateTime<Utc>,
) -> FillResult {
    let outcome = apply_fill(position, order, qty, price, fee, now);

    let (trade_log, psychology_update) = match outcome.realized_pnl {
        Some(pnl) => {
            let log = realized_trade_log(order, pnl, now);
            let update = update_bot_after_realized_pnl(&mut bot.psychology, global_risk, pnl, now);
            tc_risk::apply_pause(&mut bot.status, &update);
            (log, Some(update))
        }
        None => (
            TradeLog {
                id: uuid::Uuid::new_v4(),
                order_id: order.id,
                bot_id: order.bot_id,
                status: tc_schemas::TradeLogStatus::Filled,
                pnl: None,
                recorded_at: now,
            },
            None,
        ),
    };

    FillResult { execution: outcome.execution, trade_log, realized_pnl: outcome.realized_pnl, psychology_update }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::{AllocationState, BotStatus, EngineMode, OrderSide, OrderStatus, PsychologyState, RiskCaps, TradingWindow};
    use uuid::Uuid;

    fn bot() -> Bot {
        Bot {
            id: Uuid::new_v4(),
            owner: "op".into(),
            name: "b".into(),
            asset_symbol: "EURUSD".into(),
            broker_account_id: Uuid::new_v4(),
            status: BotStatus::Active,
            auto_trade: true,
            engine_mode: EngineMode::External,
            default_timeframe: "M15".into(),
            default_qty: Decimal8::from_f64(0.1),
            allowed_timeframes: vec!["M15".into()],
            enabled_strategies: vec![],
            decision_min_score: 0.5,
            risk_caps: RiskCaps { max_concurrent_positions: 1, max_trades_per_day: 10, trade_interval_minutes: 5 },
            trading_window: TradingWindow::always_on(),
            psychology: PsychologyState {
                current_loss_streak: 1,
                paused_until: None,
                max_loss_streak_before_pause: 2,
                loss_streak_cooldown_min: 30,
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

    fn order(side: OrderSide, bot_id: Uuid) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            bot_id,
            broker_account_id: Uuid::new_v4(),
            client_order_id: "x".into(),
            broker_order_id: None,
            symbol: "EURUSD".into(),
            side,
            qty: Decimal8::from_f64(0.1),
            price: None,
            sl: None,
            tp: None,
            status: OrderStatus::Filled,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn a_losing_close_advances_the_streak_and_can_trigger_a_pause() {
        let mut b = bot();
        let bot_id = b.id;
        let global = GlobalRiskSettings::unset();
        let mut pos = Position::flat(b.broker_account_id, "EURUSD");
        process_fill(&mut b, &global, &mut pos, &order(OrderSide::Buy, bot_id), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        let result = process_fill(&mut b, &global, &mut pos, &order(OrderSide::Sell, bot_id), Decimal8::from_f64(0.1), Decimal8::from_f64(1.0900), Decimal8::ZERO, Utc::now());
        assert_eq!(result.realized_pnl, Some(Decimal8::from_f64(-0.01)));
        assert_eq!(b.psychology.current_loss_streak, 2);
        assert_eq!(b.status, BotStatus::Paused);
    }

    #[test]
    fn an_opening_fill_does_not_touch_psychology() {
        let mut b = bot();
        let bot_id = b.id;
        let global = GlobalRiskSettings::unset();
        let mut pos = Position::flat(b.broker_account_id, "EURUSD");
        let result = process_fill(&mut b, &global, &mut pos, &order(OrderSide::Buy, bot_id), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        assert!(result.psychology_update.is_none());
        assert_eq!(b.psychology.current_loss_streak, 1);
    }
}
