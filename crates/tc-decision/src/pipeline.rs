//! The decision pipeline: turns one `Signal` into exactly one `Decision`,
//! evaluating risk, score, position-conflict, and cadence gates in order
//! and refusing at the first one that fails — the same sequential-gate
//! style the broker-side choke point uses, just with decisions instead of
//! broker calls.

use tc_schemas::{Bot, Decision, DecisionAction, DecisionParams, Signal, SignalDirection};
use uuid::Uuid;

use crate::flip::{resolve_flip, FlipVerdict};
use crate::types::{DecisionContext, ProposedOpen};

const INTERNAL_SOURCE_PREFIX: &str = "engine:";

/// Output of one pipeline run: the primary decision (open, close, or
/// ignore) plus an optional paired close when a flip was dispatched.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutcome {
    pub decision: Decision,
    pub flip_close: Option<Decision>,
}

impl PipelineOutcome {
    fn ignore(signal: &Signal, bot: &Bot, reason: &str) -> Self {
        Self {
            decision: Decision::ignore(signal.id, bot.id, reason),
            flip_close: None,
        }
    }
}

fn read_f64(payload: &serde_json::Value, key: &str) -> Option<f64> {
    payload.get(key).and_then(|v| v.as_f64())
}

fn propose_open(signal: &Signal) -> ProposedOpen {
    if signal.source.starts_with(INTERNAL_SOURCE_PREFIX) {
        ProposedOpen {
            sl: read_f64(&signal.payload, "sl").map(tc_primitives::Decimal8::from_f64),
            tp: read_f64(&signal.payload, "tp").map(tc_primitives::Decimal8::from_f64),
            qty: read_f64(&signal.payload, "qty").map(tc_primitives::Decimal8::from_f64),
            score: read_f64(&signal.payload, "score").unwrap_or(0.5),
        }
    } else {
        ProposedOpen {
            sl: None,
            tp: None,
            qty: None,
            score: read_f64(&signal.payload, "score").unwrap_or(0.5),
        }
    }
}

fn effective_min_score(bot: &Bot, ctx: &DecisionContext) -> f64 {
    bot.decision_min_score.max(ctx.runtime.decision_min_score)
}

fn net_direction_conflicts(net_qty: tc_primitives::Decimal8, direction: SignalDirection) -> Option<bool> {
    if net_qty.is_zero() {
        return None;
    }
    let position_is_long = net_qty.is_positive();
    let signal_is_buy = direction == SignalDirection::Buy;
    Some(position_is_long == signal_is_buy)
}

fn build_scalp_params(bot: &Bot, ctx: &DecisionContext) -> DecisionParams {
    let qty = bot
        .default_qty
        .checked_mul(tc_primitives::Decimal8::from_f64(ctx.runtime.decision_scalp_qty_multiplier));
    DecisionParams {
        sl: None,
        tp: None,
        qty,
        position_id: None,
        scalp: true,
    }
}

/// Run the full pipeline for one `(signal, bot)` pair.
pub fn evaluate_signal(signal: &Signal, bot: &Bot, ctx: &DecisionContext) -> PipelineOutcome {
    // 2) Risk check — pre-evaluated by the caller via tc-risk.
    if let Some(reason) = &ctx.risk_block {
        return PipelineOutcome::ignore(signal, bot, reason);
    }

    // 1) Strategy propose.
    let proposed = propose_open(signal);

    // 3) Score floor.
    if proposed.score < effective_min_score(bot, ctx) {
        return PipelineOutcome::ignore(signal, bot, "score_below_min");
    }

    // 4) Position conflict.
    let mut params = DecisionParams {
        sl: proposed.sl,
        tp: proposed.tp,
        qty: proposed.qty,
        position_id: None,
        scalp: false,
    };
    let mut reason = "open";
    let mut flip_close = None;

    match net_direction_conflicts(ctx.net_position_qty, signal.direction) {
        Some(true) => return PipelineOutcome::ignore(signal, bot, "existing_position_same_direction"),
        Some(false) if !ctx.hedging_enabled => {
            if proposed.score >= ctx.runtime.decision_flip_score {
                let position_id = match ctx.open_position_id {
                    Some(id) => id,
                    None => return PipelineOutcome::ignore(signal, bot, "existing_position_opposite_blocked"),
                };
                match resolve_flip(ctx, signal.id, bot.id, position_id) {
                    FlipVerdict::Allowed(close) => {
                        reason = "flip_open";
                        flip_close = Some(close);
                    }
                    FlipVerdict::Blocked(why) => return PipelineOutcome::ignore(signal, bot, why),
                }
            } else if ctx.bot_allows_opposite_scalp {
                params = build_scalp_params(bot, ctx);
                reason = "scalp_open";
            } else {
                return PipelineOutcome::ignore(signal, bot, "existing_position_opposite_blocked");
            }
        }
        Some(false) => {
            // Opposite direction but hedging enabled: allow the stack.
        }
        None => {}
    }

    // 5) Daily fill cap.
    if ctx.filled_orders_today >= ctx.max_trades_per_day {
        return PipelineOutcome::ignore(signal, bot, "daily_trade_limit_reached");
    }

    // 6) Minimum interval.
    if ctx
        .minutes_since_last_open_decision
        .map(|m| m < ctx.trade_interval_minutes)
        .unwrap_or(false)
    {
        return PipelineOutcome::ignore(signal, bot, "trade_interval_not_elapsed");
    }

    // 7) Persist decision (the repository call itself is the caller's job).
    let decision = Decision {
        id: Uuid::new_v4(),
        signal_id: signal.id,
        bot_id: bot.id,
        action: DecisionAction::Open,
        reason: reason.to_string(),
        score: proposed.score,
        params,
    };

    PipelineOutcome { decision, flip_close }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tc_primitives::Decimal8;
    use tc_schemas::{
        AllocationState, BotStatus, EngineMode, PsychologyState, RiskCaps, TradingWindow,
    };

    fn bot() -> Bot {
        Bot {
            id: Uuid::new_v4(),
            owner: "owner".into(),
            name: "bot".into(),
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
            risk_caps: RiskCaps { max_concurrent_positions: 1, max_trades_per_day: 5, trade_interval_minutes: 5 },
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
            scalper_params: serde_json::Value::Null,
            last_htf_bias: None,
        }
    }

    fn signal(direction: SignalDirection, score: f64) -> Signal {
        Signal {
            id: Uuid::new_v4(),
            source: "webhook:tradingview".into(),
            symbol: "EURUSD".into(),
            timeframe: "M15".into(),
            direction,
            payload: serde_json::json!({ "score": score }),
            dedupe_key: "dk".into(),
            bot_id: None,
            created_at: Utc::now(),
        }
    }

    fn ctx() -> DecisionContext {
        DecisionContext {
            now: Utc::now(),
            risk_block: None,
            runtime: Default::default(),
            hedging_enabled: false,
            net_position_qty: Decimal8::ZERO,
            open_position_id: None,
            bot_allows_opposite_scalp: false,
            filled_orders_today: 0,
            max_trades_per_day: 5,
            minutes_since_last_open_decision: None,
            trade_interval_minutes: 5,
            minutes_since_last_flip_close: None,
            flips_today: 0,
        }
    }

    #[test]
    fn low_score_is_ignored() {
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.2), &bot(), &ctx());
        assert_eq!(outcome.decision.action, DecisionAction::Ignore);
        assert_eq!(outcome.decision.reason, "score_below_min");
    }

    #[test]
    fn clean_signal_opens() {
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.8), &bot(), &ctx());
        assert_eq!(outcome.decision.action, DecisionAction::Open);
        assert_eq!(outcome.decision.reason, "open");
    }

    #[test]
    fn same_direction_existing_position_is_ignored() {
        let mut c = ctx();
        c.net_position_qty = Decimal8::from_f64(0.1);
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.8), &bot(), &c);
        assert_eq!(outcome.decision.reason, "existing_position_same_direction");
    }

    #[test]
    fn high_score_opposite_triggers_flip() {
        let mut c = ctx();
        c.net_position_qty = Decimal8::from_f64(-0.1);
        c.open_position_id = Some(Uuid::new_v4());
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.9), &bot(), &c);
        assert_eq!(outcome.decision.reason, "flip_open");
        assert!(outcome.flip_close.is_some());
        assert_eq!(outcome.flip_close.unwrap().action, DecisionAction::Close);
    }

    #[test]
    fn low_score_opposite_without_scalp_allowance_is_blocked() {
        let mut c = ctx();
        c.net_position_qty = Decimal8::from_f64(-0.1);
        c.open_position_id = Some(Uuid::new_v4());
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.6), &bot(), &c);
        assert_eq!(outcome.decision.reason, "existing_position_opposite_blocked");
    }

    #[test]
    fn daily_cap_blocks_open() {
        let mut c = ctx();
        c.filled_orders_today = 5;
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.8), &bot(), &c);
        assert_eq!(outcome.decision.reason, "daily_trade_limit_reached");
    }

    #[test]
    fn too_soon_after_last_decision_is_ignored() {
        let mut c = ctx();
        c.minutes_since_last_open_decision = Some(1);
        let outcome = evaluate_signal(&signal(SignalDirection::Buy, 0.8), &bot(), &c);
        assert_eq!(outcome.decision.reason, "trade_interval_not_elapsed");
    }
}
