//! Multi-strategy arbitrator: runs every allowed catalog strategy against
//! the same candles and resolves conflicting outcomes into a single
//! decision, or refuses to decide when strategies disagree on direction.

use serde::{Deserialize, Serialize};
use tc_primitives::indicators;

use crate::catalog;
use crate::types::{Direction, EngineContext, StrategyOutcome};

/// Priority order, highest first. A name absent from this list loses to
/// every name present in it; among unlisted names the highest score wins.
const PRIORITY_ORDER: &[&str] = &[
    "sansen_sutsumi_liquidity",
    "sanpe_tonkachi_fvg",
    "momentum_ignition",
    "trend_pullback",
    "breakout_retest",
    "range_reversion",
    "price_action_pinbar",
    "doji_breakout",
    "three_soldiers",
    "shooting_star",
    "hammer",
    "marubozu",
    "engulfing",
    "harami",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Up,
    Down,
    Flat,
}

/// The arbitrator's final verdict: either a chosen outcome (with the
/// strategies that agreed with it) or a skip reason.
#[derive(Clone, Debug)]
pub struct ArbitratorResult {
    pub outcome: StrategyOutcome,
    pub trend: TrendLabel,
    pub candidates: usize,
}

fn compute_trend(ctx: &EngineContext<'_>) -> TrendLabel {
    let change = indicators::pct_change(ctx.entry_candles, 20);
    if change.to_f64() > 0.001 {
        TrendLabel::Up
    } else if change.to_f64() < -0.001 {
        TrendLabel::Down
    } else {
        TrendLabel::Flat
    }
}

fn priority_rank(name: &str) -> usize {
    PRIORITY_ORDER.iter().position(|&n| n == name).unwrap_or(PRIORITY_ORDER.len())
}

/// Run the full catalog (filtered by `ctx.allowed_strategies` when set) and
/// arbitrate among the outcomes that want to open a position.
pub fn arbitrate(ctx: &EngineContext<'_>) -> ArbitratorResult {
    if ctx.entry_candles.is_empty() {
        return ArbitratorResult {
            outcome: StrategyOutcome::skip("arbitrator", "no_candles"),
            trend: TrendLabel::Flat,
            candidates: 0,
        };
    }

    let trend = compute_trend(ctx);

    let strategies = catalog::all_strategies();
    let mut candidates: Vec<StrategyOutcome> = strategies
        .iter()
        .filter(|s| match ctx.allowed_strategies {
            Some(allowed) => allowed.iter().any(|a| a == s.name()),
            None => true,
        })
        .map(|s| s.evaluate(ctx))
        .filter(|o| o.is_open())
        .collect();

    if candidates.is_empty() {
        return ArbitratorResult {
            outcome: StrategyOutcome::skip("arbitrator", "no_strategy_signal"),
            trend,
            candidates: 0,
        };
    }

    let has_buy = candidates.iter().any(|o| o.direction == Some(Direction::Buy));
    let has_sell = candidates.iter().any(|o| o.direction == Some(Direction::Sell));
    if has_buy && has_sell {
        return ArbitratorResult {
            outcome: StrategyOutcome::skip("arbitrator", "multi_strategy_direction_conflict"),
            trend,
            candidates: candidates.len(),
        };
    }

    candidates.sort_by(|a, b| {
        let ranked = priority_rank(&a.strategy).cmp(&priority_rank(&b.strategy));
        if ranked != std::cmp::Ordering::Equal {
            ranked
        } else {
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
        }
    });

    let chosen_count = candidates.len();
    let mut chosen = candidates.into_iter().next().unwrap();
    let trend_label = match trend {
        TrendLabel::Up => "up",
        TrendLabel::Down => "down",
        TrendLabel::Flat => "flat",
    };
    chosen.metadata = serde_json::json!({ "trend": trend_label });

    ArbitratorResult {
        outcome: chosen,
        trend,
        candidates: chosen_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_primitives::Candle;

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|_| {
                Candle::new(
                    chrono::Utc::now(),
                    tc_primitives::Decimal8::from_f64(1.0),
                    tc_primitives::Decimal8::from_f64(1.0),
                    tc_primitives::Decimal8::from_f64(1.0),
                    tc_primitives::Decimal8::from_f64(1.0),
                    10,
                )
            })
            .collect()
    }

    #[test]
    fn empty_candles_skips() {
        let ctx = EngineContext {
            symbol: "EURUSD".into(),
            timeframe: "M5".into(),
            entry_candles: &[],
            htf_candles: None,
            allowed_strategies: None,
        };
        let result = arbitrate(&ctx);
        assert_eq!(result.outcome.reason, "no_candles");
    }

    #[test]
    fn flat_featureless_candles_skip_with_no_signal() {
        let candles = flat_candles(60);
        let ctx = EngineContext {
            symbol: "EURUSD".into(),
            timeframe: "M5".into(),
            entry_candles: &candles,
            htf_candles: None,
            allowed_strategies: None,
        };
        let result = arbitrate(&ctx);
        assert_eq!(result.outcome.reason, "no_strategy_signal");
    }
}
