//! Momentum ignition: a sharp 5-bar impulse followed by a shallow pullback
//! that hasn't given back much of the move, with a minimum volume floor.

use tc_primitives::Decimal8;

use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const NAME: &str = "momentum_ignition";
const IMPULSE_BARS: usize = 5;
const MIN_IMPULSE_PCT: f64 = 0.0007;
const MAX_PULLBACK_FRACTION: f64 = 0.75;
const MIN_TICK_VOLUME: i64 = 50;

pub struct MomentumIgnitionStrategy;

impl Strategy for MomentumIgnitionStrategy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < IMPULSE_BARS + 2 {
            return StrategyOutcome::skip(NAME, "insufficient_candles");
        }
        let last = candles.last().unwrap();
        if last.tick_volume < MIN_TICK_VOLUME {
            return StrategyOutcome::skip(NAME, "insufficient_volume");
        }

        let impulse_start = &candles[candles.len() - 1 - IMPULSE_BARS];
        let impulse_end = &candles[candles.len() - 2];
        if impulse_start.close.is_zero() {
            return StrategyOutcome::skip(NAME, "zero_reference_price");
        }
        let impulse_change = (impulse_end.close - impulse_start.close).to_f64() / impulse_start.close.to_f64();
        if impulse_change.abs() < MIN_IMPULSE_PCT {
            return StrategyOutcome::skip(NAME, "impulse_too_small");
        }
        let direction = if impulse_change > 0.0 { Direction::Buy } else { Direction::Sell };

        let impulse_range = (impulse_end.close - impulse_start.close).abs();
        if impulse_range.is_zero() {
            return StrategyOutcome::skip(NAME, "zero_impulse_range");
        }
        let pullback = match direction {
            Direction::Buy => impulse_end.close.saturating_sub(last.close),
            Direction::Sell => last.close.saturating_sub(impulse_end.close),
        };
        let pullback_fraction = pullback.to_f64() / impulse_range.to_f64();
        if pullback_fraction < 0.0 || pullback_fraction > MAX_PULLBACK_FRACTION {
            return StrategyOutcome::skip(NAME, "pullback_too_deep");
        }

        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = impulse_start.close;
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_f64(2.2)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = impulse_start.close;
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_f64(2.2)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let score = ((impulse_change.abs() / 0.003).min(0.6) + (1.0 - pullback_fraction) * 0.4).clamp(0.0, 1.0);

        StrategyOutcome::open(NAME, direction, sl, tp, "momentum_ignition_continuation", score)
    }
}
