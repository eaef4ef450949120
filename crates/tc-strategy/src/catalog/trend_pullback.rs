//! Trend pullback: price pulls back toward a trending EMA(20) and shows a
//! wick-rejection candle back in the trend's direction, optionally
//! confirmed by a recent Williams fractal.

use tc_primitives::{indicators, Decimal8};

use crate::support;
use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const NAME: &str = "trend_pullback";
const SLOPE_FLOOR: f64 = 0.0005;

pub struct TrendPullbackStrategy;

impl Strategy for TrendPullbackStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < 22 {
            return StrategyOutcome::skip(NAME, "insufficient_candles");
        }
        let slope = support::ema_slope_pct(candles, 20);
        if slope.abs() < SLOPE_FLOOR {
            return StrategyOutcome::skip(NAME, "slope_below_floor");
        }
        let direction = if slope > 0.0 { Direction::Buy } else { Direction::Sell };

        let last = candles.last().unwrap();
        let ema20 = indicators::ema(candles, 20);
        let on_correct_side = match direction {
            Direction::Buy => last.close >= ema20,
            Direction::Sell => last.close <= ema20,
        };
        if !on_correct_side {
            return StrategyOutcome::skip(NAME, "close_wrong_side_of_ema");
        }

        let atr12 = indicators::atr_mean(candles, 12);
        if atr12.is_zero() {
            return StrategyOutcome::skip(NAME, "insufficient_atr");
        }
        let distance = (last.close - ema20).abs().to_f64() / atr12.to_f64();
        if distance > 0.85 {
            return StrategyOutcome::skip(NAME, "too_far_from_ema");
        }

        let (wick, body) = match direction {
            Direction::Buy => (last.lower_wick(), last.body()),
            Direction::Sell => (last.upper_wick(), last.body()),
        };
        if body.is_zero() {
            return StrategyOutcome::skip(NAME, "zero_body");
        }
        let rejection_ratio = wick.to_f64() / body.to_f64();
        if rejection_ratio < 1.2 {
            return StrategyOutcome::skip(NAME, "insufficient_rejection");
        }

        let fractals = indicators::williams_fractals(candles, 2);
        let fractal_confirmed = match direction {
            Direction::Buy => fractals.down.iter().rev().take(5).any(|&b| b),
            Direction::Sell => fractals.up.iter().rev().take(5).any(|&b| b),
        };

        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = last.low;
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = last.high;
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let score = (0.4 * (rejection_ratio / 3.0).min(1.0)
            + 0.3 * (1.0 - distance / 0.85).max(0.0)
            + 0.2 * (slope.abs() / 0.01).min(1.0)
            + if fractal_confirmed { 0.1 } else { 0.0 })
        .clamp(0.0, 1.0);

        StrategyOutcome::open(NAME, direction, sl, tp, "ema_pullback_rejection", score)
    }
}
