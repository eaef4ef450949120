//! Composite "smart money concept" strategies: each pairs a structural
//! detector with a liquidity sweep and a candlestick confirmation, and
//! rejects when the higher-timeframe bias is strongly against the trade.

use tc_primitives::{indicators, Candle, Decimal8};

use crate::catalog::candlestick::{bullish_engulfing_shape, bearish_engulfing_shape};
use crate::support;
use crate::types::{Direction, EngineContext, Strategy, StrategyOutcome};

const LOOKBACK: usize = 30;
const TRIPLE_TOLERANCE: f64 = 0.0006;

/// Htf bias in the direction opposite the trade, strong enough to veto it.
fn htf_strongly_against(htf: Option<&[Candle]>, direction: Direction) -> bool {
    let htf = match htf {
        Some(c) if c.len() >= 22 => c,
        _ => return false,
    };
    let slope = support::ema_slope_pct(htf, 20);
    match direction {
        Direction::Buy => slope < -0.01,
        Direction::Sell => slope > 0.01,
    }
}

fn has_triple_bottom(candles: &[Candle], tolerance: f64) -> bool {
    if candles.len() < LOOKBACK {
        return false;
    }
    let window = &candles[candles.len() - LOOKBACK..];
    let lows: Vec<Decimal8> = window.iter().map(|c| c.low).collect();
    let min = lows.iter().copied().min().unwrap();
    let near_min = lows.iter().filter(|&&l| (l - min).abs().to_f64() <= tolerance * min.to_f64().abs().max(1e-9)).count();
    near_min >= 3
}

fn has_triple_top(candles: &[Candle], tolerance: f64) -> bool {
    if candles.len() < LOOKBACK {
        return false;
    }
    let window = &candles[candles.len() - LOOKBACK..];
    let highs: Vec<Decimal8> = window.iter().map(|c| c.high).collect();
    let max = highs.iter().copied().max().unwrap();
    let near_max = highs.iter().filter(|&&h| (h - max).abs().to_f64() <= tolerance * max.to_f64().abs().max(1e-9)).count();
    near_max >= 3
}

/// A liquidity sweep: the current bar pierces the recent extreme and then
/// closes back inside the prior range (a stop run, not a breakout).
fn swept_low(candles: &[Candle]) -> bool {
    if candles.len() < LOOKBACK + 1 {
        return false;
    }
    let last = candles.last().unwrap();
    let prior = &candles[candles.len() - 1 - LOOKBACK..candles.len() - 1];
    let prior_low = indicators::lowest_low(prior, LOOKBACK);
    last.low < prior_low && last.close > prior_low
}

fn swept_high(candles: &[Candle]) -> bool {
    if candles.len() < LOOKBACK + 1 {
        return false;
    }
    let last = candles.last().unwrap();
    let prior = &candles[candles.len() - 1 - LOOKBACK..candles.len() - 1];
    let prior_high = indicators::highest_high(prior, LOOKBACK);
    last.high > prior_high && last.close < prior_high
}

/// A bullish fair value gap: candle `i-2`'s high sits below candle `i`'s low
/// (the three-candle imbalance pattern), unfilled as of the current bar.
fn bullish_fvg_present(candles: &[Candle]) -> bool {
    if candles.len() < 3 {
        return false;
    }
    let n = candles.len();
    candles[n - 3].high < candles[n - 1].low
}

fn bearish_fvg_present(candles: &[Candle]) -> bool {
    if candles.len() < 3 {
        return false;
    }
    let n = candles.len();
    candles[n - 3].low > candles[n - 1].high
}

/// `sansen_sutsumi_liquidity`: triple bottom/top, swept, confirmed by an
/// engulfing candle in the reversal direction.
pub struct LiquiditySweepStrategy;

impl Strategy for LiquiditySweepStrategy {
    fn name(&self) -> &'static str {
        "sansen_sutsumi_liquidity"
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < LOOKBACK + 2 {
            return StrategyOutcome::skip(self.name(), "insufficient_candles");
        }

        let (direction, structure_ok, swept) = if has_triple_bottom(candles, TRIPLE_TOLERANCE) && swept_low(candles) {
            (Direction::Buy, true, true)
        } else if has_triple_top(candles, TRIPLE_TOLERANCE) && swept_high(candles) {
            (Direction::Sell, true, true)
        } else {
            (Direction::Buy, false, false)
        };
        if !structure_ok || !swept {
            return StrategyOutcome::skip(self.name(), "no_structure_and_sweep");
        }

        let shape = match direction {
            Direction::Buy => bullish_engulfing_shape(candles),
            Direction::Sell => bearish_engulfing_shape(candles),
        };
        let shape = match shape {
            Some(s) => s,
            None => return StrategyOutcome::skip(self.name(), "no_candle_confirmation"),
        };

        if htf_strongly_against(ctx.htf_candles, direction) {
            return StrategyOutcome::skip(self.name(), "htf_bias_against");
        }

        let last = candles.last().unwrap();
        let atr = indicators::atr_mean(candles, 14);
        let buffer = atr.checked_mul(Decimal8::from_f64(0.25)).unwrap_or(Decimal8::ZERO);
        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = last.low.saturating_sub(buffer);
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = last.high.saturating_add(buffer);
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let score = (0.5 + 0.5 * shape.shape_quality).clamp(0.0, 1.0);
        StrategyOutcome::open(self.name(), direction, sl, tp, "liquidity_sweep_reversal", score)
    }
}

/// `sanpe_tonkachi_fvg`: an unfilled fair value gap plus a liquidity sweep
/// of the opposite extreme, confirmed by an engulfing candle.
pub struct FvgSweepStrategy;

impl Strategy for FvgSweepStrategy {
    fn name(&self) -> &'static str {
        "sanpe_tonkachi_fvg"
    }

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
        let candles = ctx.entry_candles;
        if candles.len() < LOOKBACK + 2 {
            return StrategyOutcome::skip(self.name(), "insufficient_candles");
        }

        let (direction, ok) = if bullish_fvg_present(candles) && swept_low(candles) {
            (Direction::Buy, true)
        } else if bearish_fvg_present(candles) && swept_high(candles) {
            (Direction::Sell, true)
        } else {
            (Direction::Buy, false)
        };
        if !ok {
            return StrategyOutcome::skip(self.name(), "no_fvg_and_sweep");
        }

        let shape = match direction {
            Direction::Buy => bullish_engulfing_shape(candles),
            Direction::Sell => bearish_engulfing_shape(candles),
        };
        let shape = match shape {
            Some(s) => s,
            None => return StrategyOutcome::skip(self.name(), "no_candle_confirmation"),
        };

        if htf_strongly_against(ctx.htf_candles, direction) {
            return StrategyOutcome::skip(self.name(), "htf_bias_against");
        }

        let last = candles.last().unwrap();
        let atr = indicators::atr_mean(candles, 14);
        let buffer = atr.checked_mul(Decimal8::from_f64(0.25)).unwrap_or(Decimal8::ZERO);
        let entry = last.close;
        let (sl, tp) = match direction {
            Direction::Buy => {
                let sl = last.low.saturating_sub(buffer);
                let risk = entry.saturating_sub(sl);
                (sl, entry.saturating_add(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
            Direction::Sell => {
                let sl = last.high.saturating_add(buffer);
                let risk = sl.saturating_sub(entry);
                (sl, entry.saturating_sub(risk.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO)))
            }
        };

        let score = (0.5 + 0.5 * shape.shape_quality).clamp(0.0, 1.0);
        StrategyOutcome::open(self.name(), direction, sl, tp, "fvg_sweep_reversal", score)
    }
}
