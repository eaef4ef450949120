//! Shared evaluation pipeline for the single-bar-or-few-bar reversal and
//! continuation patterns: harami, engulfing, hammer, shooting star,
//! marubozu, three soldiers. Each pattern only supplies a shape test; the
//! range-sanity, trend, location, risk/reward, and scoring steps are
//! identical across the family.

use tc_primitives::{indicators, Candle, Decimal8};

use crate::support;
use crate::types::{Direction, StrategyOutcome};

pub struct ShapeMatch {
    pub direction: Direction,
    pub shape_quality: f64,
}

pub struct CandlestickSpec {
    pub name: &'static str,
    pub reversal: bool,
    pub quality_floor: f64,
    pub atr_period: usize,
    pub trend_lookback: usize,
    pub swing_lookback: usize,
    pub sl_buffer_atr: f64,
    pub reward_multiple: f64,
}

impl CandlestickSpec {
    pub const fn reversal(name: &'static str) -> Self {
        CandlestickSpec {
            name,
            reversal: true,
            quality_floor: 0.0,
            atr_period: 14,
            trend_lookback: 20,
            swing_lookback: 20,
            sl_buffer_atr: 0.25,
            reward_multiple: 2.0,
        }
    }

    pub const fn continuation(name: &'static str) -> Self {
        CandlestickSpec {
            reversal: false,
            ..Self::reversal(name)
        }
    }
}

pub fn evaluate<F>(candles: &[Candle], spec: &CandlestickSpec, shape_fn: F) -> StrategyOutcome
where
    F: Fn(&[Candle]) -> Option<ShapeMatch>,
{
    let min_len = spec.atr_period.max(spec.trend_lookback + 2).max(spec.swing_lookback) + 2;
    if candles.len() < min_len {
        return StrategyOutcome::skip(spec.name, "insufficient_candles");
    }

    let atr = indicators::atr_mean(candles, spec.atr_period);
    if atr.is_zero() {
        return StrategyOutcome::skip(spec.name, "insufficient_atr");
    }

    let last = candles.last().unwrap();
    if !support::within_atr_band(last.range(), atr, 0.5, 3.0) {
        return StrategyOutcome::skip(spec.name, "range_out_of_band");
    }

    let shape = match shape_fn(candles) {
        Some(s) => s,
        None => return StrategyOutcome::skip(spec.name, "shape_mismatch"),
    };

    let trend = support::atr_normalized_trend(candles, spec.trend_lookback, atr);
    let trend_ok = if spec.reversal {
        match shape.direction {
            Direction::Buy => trend < -0.1,
            Direction::Sell => trend > 0.1,
        }
    } else {
        match shape.direction {
            Direction::Buy => trend > 0.1,
            Direction::Sell => trend < -0.1,
        }
    };
    if !trend_ok {
        return StrategyOutcome::skip(spec.name, "trend_requirement_not_met");
    }

    let location_atr = match shape.direction {
        Direction::Buy => support::distance_to_swing_low_atr(candles, spec.swing_lookback, last.low, atr),
        Direction::Sell => support::distance_to_swing_high_atr(candles, spec.swing_lookback, last.high, atr),
    };
    if location_atr > 0.75 {
        return StrategyOutcome::skip(spec.name, "not_near_swing");
    }

    let buffer = atr.checked_mul(Decimal8::from_f64(spec.sl_buffer_atr)).unwrap_or(Decimal8::ZERO);
    let entry = last.close;
    let (sl, tp) = match shape.direction {
        Direction::Buy => {
            let sl = last.low.saturating_sub(buffer);
            let risk = entry.saturating_sub(sl);
            let tp = entry.saturating_add(risk.checked_mul(Decimal8::from_f64(spec.reward_multiple)).unwrap_or(Decimal8::ZERO));
            (sl, tp)
        }
        Direction::Sell => {
            let sl = last.high.saturating_add(buffer);
            let risk = sl.saturating_sub(entry);
            let tp = entry.saturating_sub(risk.checked_mul(Decimal8::from_f64(spec.reward_multiple)).unwrap_or(Decimal8::ZERO));
            (sl, tp)
        }
    };

    let range_norm = (last.range().to_f64() / (atr.to_f64() * 3.0)).min(1.0);
    let proximity = (1.0 - location_atr / 0.75).max(0.0);
    let trend_bonus = (trend.abs() / 2.0).min(0.2);
    let score = (0.3 * range_norm + 0.4 * shape.shape_quality + 0.2 * proximity + trend_bonus).clamp(0.0, 1.0);

    if score < spec.quality_floor {
        return StrategyOutcome::skip(spec.name, "below_quality_floor");
    }

    StrategyOutcome::open(spec.name, shape.direction, sl, tp, "pattern_match", score)
}

pub fn bullish_harami_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    if candles.len() < 2 {
        return None;
    }
    let prev = &candles[candles.len() - 2];
    let last = candles.last().unwrap();
    if !prev.is_bearish() || !last.is_bullish() {
        return None;
    }
    let inside = last.open >= prev.close && last.close <= prev.open;
    if !inside {
        return None;
    }
    let containment = 1.0 - (last.body().to_f64() / prev.body().to_f64().max(1e-9)).min(1.0);
    Some(ShapeMatch {
        direction: Direction::Buy,
        shape_quality: containment.clamp(0.0, 1.0),
    })
}

pub fn bearish_harami_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    if candles.len() < 2 {
        return None;
    }
    let prev = &candles[candles.len() - 2];
    let last = candles.last().unwrap();
    if !prev.is_bullish() || !last.is_bearish() {
        return None;
    }
    let inside = last.open <= prev.close && last.close >= prev.open;
    if !inside {
        return None;
    }
    let containment = 1.0 - (last.body().to_f64() / prev.body().to_f64().max(1e-9)).min(1.0);
    Some(ShapeMatch {
        direction: Direction::Sell,
        shape_quality: containment.clamp(0.0, 1.0),
    })
}

pub fn bullish_engulfing_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    if candles.len() < 2 {
        return None;
    }
    let prev = &candles[candles.len() - 2];
    let last = candles.last().unwrap();
    if !prev.is_bearish() || !last.is_bullish() {
        return None;
    }
    if !(last.open <= prev.close && last.close >= prev.open) {
        return None;
    }
    let ratio = (last.body().to_f64() / prev.body().to_f64().max(1e-9)).min(3.0) / 3.0;
    Some(ShapeMatch { direction: Direction::Buy, shape_quality: ratio })
}

pub fn bearish_engulfing_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    if candles.len() < 2 {
        return None;
    }
    let prev = &candles[candles.len() - 2];
    let last = candles.last().unwrap();
    if !prev.is_bullish() || !last.is_bearish() {
        return None;
    }
    if !(last.open >= prev.close && last.close <= prev.open) {
        return None;
    }
    let ratio = (last.body().to_f64() / prev.body().to_f64().max(1e-9)).min(3.0) / 3.0;
    Some(ShapeMatch { direction: Direction::Sell, shape_quality: ratio })
}

pub fn hammer_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    let last = candles.last()?;
    let body = last.body();
    if body.is_zero() {
        return None;
    }
    let lower = last.lower_wick();
    let upper = last.upper_wick();
    if lower.to_f64() >= 2.0 * body.to_f64() && upper.to_f64() <= body.to_f64() {
        let quality = (lower.to_f64() / (3.0 * body.to_f64())).min(1.0);
        Some(ShapeMatch { direction: Direction::Buy, shape_quality: quality })
    } else {
        None
    }
}

pub fn shooting_star_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    let last = candles.last()?;
    let body = last.body();
    if body.is_zero() {
        return None;
    }
    let lower = last.lower_wick();
    let upper = last.upper_wick();
    if upper.to_f64() >= 2.0 * body.to_f64() && lower.to_f64() <= body.to_f64() {
        let quality = (upper.to_f64() / (3.0 * body.to_f64())).min(1.0);
        Some(ShapeMatch { direction: Direction::Sell, shape_quality: quality })
    } else {
        None
    }
}

pub fn marubozu_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    let last = candles.last()?;
    let range = last.range();
    if range.is_zero() {
        return None;
    }
    let body_ratio = last.body().to_f64() / range.to_f64();
    let upper_ratio = last.upper_wick().to_f64() / range.to_f64();
    let lower_ratio = last.lower_wick().to_f64() / range.to_f64();
    if body_ratio >= 0.7 && upper_ratio <= 0.15 && lower_ratio <= 0.15 {
        let direction = if last.is_bullish() { Direction::Buy } else { Direction::Sell };
        Some(ShapeMatch { direction, shape_quality: body_ratio })
    } else {
        None
    }
}

pub fn three_soldiers_shape(candles: &[Candle]) -> Option<ShapeMatch> {
    if candles.len() < 3 {
        return None;
    }
    let window = &candles[candles.len() - 3..];
    let all_bullish = window.iter().all(|c| c.is_bullish());
    let all_bearish = window.iter().all(|c| c.is_bearish());
    if all_bullish {
        let steps_ok = window[1].open >= window[0].open
            && window[1].open <= window[0].close
            && window[2].open >= window[1].open
            && window[2].open <= window[1].close
            && window[1].close > window[0].close
            && window[2].close > window[1].close;
        if steps_ok {
            return Some(ShapeMatch { direction: Direction::Buy, shape_quality: 0.8 });
        }
    } else if all_bearish {
        let steps_ok = window[1].open <= window[0].open
            && window[1].open >= window[0].close
            && window[2].open <= window[1].open
            && window[2].open >= window[1].close
            && window[1].close < window[0].close
            && window[2].close < window[1].close;
        if steps_ok {
            return Some(ShapeMatch { direction: Direction::Sell, shape_quality: 0.8 });
        }
    }
    None
}
