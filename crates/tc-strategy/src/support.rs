//! Shared math the catalog strategies build on: trend strength, swing
//! proximity, and EMA slope. Kept separate from `tc_primitives::indicators`
//! because these combine indicators into strategy-specific judgments rather
//! than being general-purpose series math.

use tc_primitives::indicators;
use tc_primitives::{Candle, Decimal8};

/// ATR-normalized price change over `lookback` bars, ending at the
/// second-to-last candle (the defining/confirmation bar is excluded so the
/// trend measure reflects what came *before* the signal, not the signal
/// itself). Zero if there isn't enough history or ATR is zero.
pub fn atr_normalized_trend(candles: &[Candle], lookback: usize, atr: Decimal8) -> f64 {
    if atr.is_zero() || candles.len() < lookback + 2 {
        return 0.0;
    }
    let context = &candles[..candles.len() - 1];
    let change = indicators::pct_change(context, lookback);
    // pct_change is relative; convert to an absolute move and normalize by ATR.
    let last_close = context.last().map(|c| c.close).unwrap_or(Decimal8::ZERO);
    let abs_move = change.checked_mul(last_close).unwrap_or(Decimal8::ZERO);
    if atr.is_zero() {
        0.0
    } else {
        abs_move.to_f64() / atr.to_f64()
    }
}

/// Distance from `price` to the nearest swing extreme over the last `n`
/// candles (excluding the current bar), in ATR units. Returns `f64::MAX`
/// if there isn't enough data to form a swing.
pub fn distance_to_swing_low_atr(candles: &[Candle], n: usize, price: Decimal8, atr: Decimal8) -> f64 {
    if atr.is_zero() || candles.len() < 2 {
        return f64::MAX;
    }
    let context = &candles[..candles.len() - 1];
    let low = indicators::lowest_low(context, n);
    ((price - low).abs().to_f64()) / atr.to_f64()
}

pub fn distance_to_swing_high_atr(candles: &[Candle], n: usize, price: Decimal8, atr: Decimal8) -> f64 {
    if atr.is_zero() || candles.len() < 2 {
        return f64::MAX;
    }
    let context = &candles[..candles.len() - 1];
    let high = indicators::highest_high(context, n);
    ((high - price).abs().to_f64()) / atr.to_f64()
}

/// EMA(period) slope as a fraction of price: `(ema_now - ema_prev) / ema_prev`.
/// Zero if there isn't enough history.
pub fn ema_slope_pct(candles: &[Candle], period: usize) -> f64 {
    if candles.len() < period + 2 {
        return 0.0;
    }
    let now = indicators::ema(candles, period);
    let prev = indicators::ema(&candles[..candles.len() - 1], period);
    if prev.is_zero() {
        0.0
    } else {
        (now - prev).to_f64() / prev.to_f64()
    }
}

/// `true` when `value` lies within `[lo, hi]` inclusive, expressed as
/// multiples of `atr`. Used for the range-sanity band check every
/// candlestick strategy runs before inspecting shape.
pub fn within_atr_band(value: Decimal8, atr: Decimal8, lo_mult: f64, hi_mult: f64) -> bool {
    if atr.is_zero() {
        return false;
    }
    let ratio = value.to_f64() / atr.to_f64();
    ratio >= lo_mult && ratio <= hi_mult
}
