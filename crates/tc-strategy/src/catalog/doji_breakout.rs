//! Doji breakout: a penultimate indecision candle followed by a breakout
//! past its high/low, filtered by EMA(20) trend and S/R confluence.

use tc_primitives::{indicators, Candle, Decimal8};

use crate::support;
use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const NAME: &str = "doji_breakout";

fn is_doji(c: &Candle) -> bool {
    let range = c.range();
    if range.is_zero() {
        return false;
    }
    let body_ratio = c.body().to_f64() / range.to_f64();
    let upper = c.upper_wick().to_f64() / range.to_f64();
    let lower = c.lower_wick().to_f64() / range.to_f64();
    body_ratio <= 0.2 && (upper - lower).abs() < 0.5
}

pub struct DojiBreakoutStrategy;

impl Strategy for DojiBreakoutStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < 22 {
            return StrategyOutcome::skip(NAME, "insufficient_candles");
        }
        let doji = &candles[candles.len() - 2];
        if !is_doji(doji) {
            return StrategyOutcome::skip(NAME, "penultimate_not_doji");
        }
        let last = candles.last().unwrap();
        let buffer = doji.range().checked_mul(Decimal8::from_f64(0.05)).unwrap_or(Decimal8::ZERO);

        let direction = if last.close > doji.high.saturating_add(buffer) {
            Direction::Buy
        } else if last.close < doji.low.saturating_sub(buffer) {
            Direction::Sell
        } else {
            return StrategyOutcome::skip(NAME, "no_breakout");
        };

        let slope = support::ema_slope_pct(candles, 20);
        let trend_ok = match direction {
            Direction::Buy => slope >= 0.0,
            Direction::Sell => slope <= 0.0,
        };
        if !trend_ok {
            return StrategyOutcome::skip(NAME, "ema_trend_filter");
        }

        let level = if direction == Direction::Buy { doji.high } else { doji.low };
        let tolerance = Decimal8::from_f64(0.0008);
        let take = 80usize.min(candles.len());
        let window = &candles[candles.len() - take..];
        let confluence = window.iter().filter(|c| (c.high - level).abs() <= tolerance || (c.low - level).abs() <= tolerance).count();
        if confluence < 2 {
            return StrategyOutcome::skip(NAME, "no_sr_confluence");
        }

        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = doji.low;
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_f64(1.8)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = doji.high;
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_f64(1.8)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let atr = indicators::atr_mean(candles, 14);
        let breakout_strength = if atr.is_zero() { 0.5 } else { ((entry - level).abs().to_f64() / atr.to_f64()).min(1.0) };
        let score = (0.5 * breakout_strength + 0.3 * (confluence as f64 / window.len() as f64 * 10.0).min(1.0) + 0.2).clamp(0.0, 1.0);

        StrategyOutcome::open(NAME, direction, sl, tp, "doji_breakout_confirmed", score)
    }
}
