//! Range reversion: when price is trading near the edge of a 50-bar range,
//! fade back toward the center rather than chase the edge.

use tc_primitives::indicators;
use tc_primitives::Decimal8;

use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const NAME: &str = "range_reversion";
const LOOKBACK: usize = 50;
const BAND_FACTOR: f64 = 0.25;

pub struct RangeReversionStrategy;

impl Strategy for RangeReversionStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < LOOKBACK + 1 {
            return StrategyOutcome::skip(NAME, "insufficient_candles");
        }
        let last = candles.last().unwrap();
        let window = &candles[candles.len() - LOOKBACK..];
        let high = indicators::highest_high(window, LOOKBACK);
        let low = indicators::lowest_low(window, LOOKBACK);
        let width = high.saturating_sub(low);
        if width.is_zero() {
            return StrategyOutcome::skip(NAME, "zero_width_range");
        }
        let band = width.checked_mul(Decimal8::from_f64(BAND_FACTOR)).unwrap_or(Decimal8::ZERO);

        let direction = if last.close >= high.saturating_sub(band) {
            Direction::Sell
        } else if last.close <= low.saturating_add(band) {
            Direction::Buy
        } else {
            return StrategyOutcome::skip(NAME, "not_near_edge");
        };

        let center = low.saturating_add(width.checked_div_i64(2).unwrap_or(Decimal8::ZERO));
        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = low;
                let risk = entry.saturating_sub(sl);
                let tp_rr = entry.saturating_add(risk.checked_mul(Decimal8::from_f64(1.8)).unwrap_or(Decimal8::ZERO));
                (sl, tp_rr.min(center.saturating_add(width)))
            }
            Direction::Sell => {
                let sl = high;
                let risk = sl.saturating_sub(entry);
                let tp_rr = entry.saturating_sub(risk.checked_mul(Decimal8::from_f64(1.8)).unwrap_or(Decimal8::ZERO));
                (sl, tp_rr.max(center.saturating_sub(width)))
            }
        };

        let edge_distance = match direction {
            Direction::Buy => (entry - low).abs().to_f64() / width.to_f64(),
            Direction::Sell => (high - entry).abs().to_f64() / width.to_f64(),
        };
        let score = (1.0 - edge_distance / BAND_FACTOR).clamp(0.0, 1.0) * 0.7 + 0.2;

        StrategyOutcome::open(NAME, direction, sl, tp, "range_edge_fade", score)
    }
}
