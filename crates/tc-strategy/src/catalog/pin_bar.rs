//! Price-action pin bar: a long dominant wick rejecting a level, confirmed
//! by an EMA(20) trend filter and proximity to a clustered support/
//! resistance level built from recent wick extremes.

use tc_primitives::{indicators, Candle, Decimal8};

use crate::support;
use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const NAME: &str = "price_action_pinbar";

/// Cluster wick extremes from the last `lookback` candles into S/R levels:
/// any two extremes within `tolerance` of each other count as the same
/// level, and the level's "weight" is how many extremes confirmed it.
fn sr_confluence(candles: &[Candle], lookback: usize, price: Decimal8, tolerance: f64) -> bool {
    let take = lookback.min(candles.len());
    if take == 0 {
        return false;
    }
    let window = &candles[candles.len() - take..];
    let mut hits = 0usize;
    for c in window {
        let d_high = (c.high - price).abs().to_f64();
        let d_low = (c.low - price).abs().to_f64();
        if d_high <= tolerance || d_low <= tolerance {
            hits += 1;
        }
    }
    hits >= 2
}

pub struct PinBarStrategy;

impl Strategy for PinBarStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < 22 {
            return StrategyOutcome::skip(NAME, "insufficient_candles");
        }
        let last = candles.last().unwrap();
        let range = last.range();
        if range.is_zero() {
            return StrategyOutcome::skip(NAME, "zero_range");
        }
        let body_ratio = last.body().to_f64() / range.to_f64();
        if body_ratio > 1.0 / 3.0 {
            return StrategyOutcome::skip(NAME, "body_too_large");
        }
        let upper = last.upper_wick().to_f64() / range.to_f64();
        let lower = last.lower_wick().to_f64() / range.to_f64();

        let (direction, dominant, opposite) = if lower >= 2.0 / 3.0 {
            (Direction::Buy, lower, upper)
        } else if upper >= 2.0 / 3.0 {
            (Direction::Sell, upper, lower)
        } else {
            return StrategyOutcome::skip(NAME, "no_dominant_wick");
        };
        if opposite > 0.25 {
            return StrategyOutcome::skip(NAME, "opposite_wick_too_large");
        }

        let slope = support::ema_slope_pct(candles, 20);
        let trend_ok = match direction {
            Direction::Buy => slope > 0.0,
            Direction::Sell => slope < 0.0,
        };
        if !trend_ok {
            return StrategyOutcome::skip(NAME, "ema_trend_filter");
        }

        let nose = match direction {
            Direction::Buy => last.low,
            Direction::Sell => last.high,
        };
        let tolerance = Decimal8::from_f64(0.0005);
        if !sr_confluence(candles, 80, nose, tolerance.to_f64()) {
            return StrategyOutcome::skip(NAME, "no_sr_confluence");
        }

        let nose_buffer = range.checked_mul(Decimal8::from_f64(0.10)).unwrap_or(Decimal8::ZERO);
        let entry = match direction {
            Direction::Buy => last.close.max(nose.saturating_add(nose_buffer)),
            Direction::Sell => last.close.min(nose.saturating_sub(nose_buffer)),
        };
        let sl_buffer = range.checked_mul(Decimal8::from_f64(0.10)).unwrap_or(Decimal8::ZERO);
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = nose.saturating_sub(sl_buffer);
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = nose.saturating_add(sl_buffer);
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let atr = indicators::atr_mean(candles, 14);
        let range_norm = if atr.is_zero() { 0.5 } else { (range.to_f64() / (atr.to_f64() * 2.0)).min(1.0) };
        let score = (0.5 * dominant + 0.3 * (1.0 - opposite) + 0.2 * range_norm).clamp(0.0, 1.0);

        StrategyOutcome::open(NAME, direction, sl, tp, "pin_bar_rejection", score)
    }
}
