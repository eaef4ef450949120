//! Breakout + retest: a 40-bar range is broken, then the very next bar
//! retests the broken level before (hopefully) continuing.

use tc_primitives::indicators;
use tc_primitives::Decimal8;

use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const NAME: &str = "breakout_retest";
const RANGE_LOOKBACK: usize = 40;
const MIN_WIDTH_PCT: f64 = 0.001;
const RETEST_TOLERANCE: f64 = 0.0008;

pub struct BreakoutRetestStrategy;

impl Strategy for BreakoutRetestStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < RANGE_LOOKBACK + 3 {
            return StrategyOutcome::skip(NAME, "insufficient_candles");
        }
        let last = candles.last().unwrap();
        let prev = &candles[candles.len() - 2];
        // range excludes the current bar and the bar that broke it.
        let range_window = &candles[candles.len() - 2 - RANGE_LOOKBACK..candles.len() - 2];
        let range_high = indicators::highest_high(range_window, RANGE_LOOKBACK);
        let range_low = indicators::lowest_low(range_window, RANGE_LOOKBACK);
        let width = range_high.saturating_sub(range_low);
        if range_low.is_zero() || width.to_f64() / range_low.to_f64() < MIN_WIDTH_PCT {
            return StrategyOutcome::skip(NAME, "range_too_narrow");
        }

        let direction = if prev.close > range_high {
            Direction::Buy
        } else if prev.close < range_low {
            Direction::Sell
        } else {
            return StrategyOutcome::skip(NAME, "no_prior_breakout");
        };

        let level = if direction == Direction::Buy { range_high } else { range_low };
        let tolerance = Decimal8::from_f64(RETEST_TOLERANCE);
        let retests = (last.low <= level.saturating_add(tolerance) && last.high >= level.saturating_sub(tolerance))
            || (last.close - level).abs() <= tolerance;
        if !retests {
            return StrategyOutcome::skip(NAME, "no_retest");
        }

        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = range_low;
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = range_high;
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let width_pct = width.to_f64() / range_low.to_f64().max(1e-9);
        let score = (0.5 + (width_pct / 0.02).min(0.3) + 0.2).clamp(0.0, 1.0);

        StrategyOutcome::open(NAME, direction, sl, tp, "breakout_retest_confirmed", score)
    }
}
