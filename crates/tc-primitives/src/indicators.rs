//! Indicator library. Every function here returns a neutral value (zero or
//! empty) when there isn't enough data rather than panicking or erroring —
//! callers are expected to treat a zero `atr_mean` as "unknown volatility",
//! never as "volatility is actually zero".

use crate::{Candle, Decimal8};

/// Simple moving average of the last `period` closes. Zero if `period == 0`
/// or there are fewer than `period` candles.
pub fn sma(candles: &[Candle], period: usize) -> Decimal8 {
    if period == 0 || candles.len() < period {
        return Decimal8::ZERO;
    }
    let window = &candles[candles.len() - period..];
    let sum = window
        .iter()
        .fold(Decimal8::ZERO, |acc, c| acc.saturating_add(c.close));
    sum.checked_div_i64(period as i64).unwrap_or(Decimal8::ZERO)
}

/// Iterative EMA over the whole series, seeded with the SMA of the first
/// `period` candles. Returns zero if there are fewer than `period` candles.
pub fn ema(candles: &[Candle], period: usize) -> Decimal8 {
    if period == 0 || candles.len() < period {
        return Decimal8::ZERO;
    }
    let k = Decimal8::from_int(2) / Decimal8::from_int(period as i64 + 1);
    let seed = sma(&candles[..period], period);
    let mut value = seed;
    for c in &candles[period..] {
        // ema = close*k + prev*(1-k)
        let one_minus_k = Decimal8::from_int(1) - k;
        value = c.close.checked_mul(k).unwrap_or(Decimal8::ZERO)
            + value.checked_mul(one_minus_k).unwrap_or(Decimal8::ZERO);
    }
    value
}

/// "ATR-like" volatility measure: the mean `high - low` range over the last
/// `period` candles. This is NOT Wilder's smoothed ATR — it is the simpler
/// mean-range approximation the rest of the system's sizing math assumes.
/// Zero if there isn't enough data; callers treat zero as "unknown".
pub fn atr_mean(candles: &[Candle], period: usize) -> Decimal8 {
    if period == 0 || candles.len() < period {
        return Decimal8::ZERO;
    }
    let window = &candles[candles.len() - period..];
    let sum = window
        .iter()
        .fold(Decimal8::ZERO, |acc, c| acc.saturating_add(c.range()));
    sum.checked_div_i64(period as i64).unwrap_or(Decimal8::ZERO)
}

/// Williams fractal markers. `up[i]` is true when `high[i]` is the maximum
/// of the `2*period+1`-wide window centered on `i`; `down[i]` mirrors on
/// lows. The first and last `period` indices are never marked (insufficient
/// context on either side).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fractals {
    pub up: Vec<bool>,
    pub down: Vec<bool>,
}

pub fn williams_fractals(candles: &[Candle], period: usize) -> Fractals {
    let n = candles.len();
    let mut up = vec![false; n];
    let mut down = vec![false; n];
    if period == 0 || n < 2 * period + 1 {
        return Fractals { up, down };
    }
    for i in period..n - period {
        let window = &candles[i - period..=i + period];
        let max_high = window.iter().map(|c| c.high).max().unwrap();
        let min_low = window.iter().map(|c| c.low).min().unwrap();
        up[i] = candles[i].high == max_high;
        down[i] = candles[i].low == min_low;
    }
    Fractals { up, down }
}

/// Highest high over the last `n` candles (excluding none). Zero if empty.
pub fn highest_high(candles: &[Candle], n: usize) -> Decimal8 {
    let take = n.min(candles.len());
    candles[candles.len() - take..]
        .iter()
        .map(|c| c.high)
        .max()
        .unwrap_or(Decimal8::ZERO)
}

/// Lowest low over the last `n` candles. Zero if empty.
pub fn lowest_low(candles: &[Candle], n: usize) -> Decimal8 {
    let take = n.min(candles.len());
    candles[candles.len() - take..]
        .iter()
        .map(|c| c.low)
        .min()
        .unwrap_or(Decimal8::ZERO)
}

/// Percentage change of close over the last `n` bars:
/// `(close_now - close_n_ago) / close_n_ago`. Zero if insufficient data or
/// the reference close is zero.
pub fn pct_change(candles: &[Candle], n: usize) -> Decimal8 {
    if candles.len() <= n || n == 0 {
        return Decimal8::ZERO;
    }
    let now = candles.last().unwrap().close;
    let then = candles[candles.len() - 1 - n].close;
    if then.is_zero() {
        return Decimal8::ZERO;
    }
    (now - then) / then
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(o: f64, h: f64, l: f64, c: f64) -> Candle {
        Candle::new(
            Utc.timestamp_opt(0, 0).unwrap(),
            Decimal8::from_f64(o),
            Decimal8::from_f64(h),
            Decimal8::from_f64(l),
            Decimal8::from_f64(c),
            100,
        )
    }
    use chrono::Utc;

    #[test]
    fn sma_insufficient_data_is_zero() {
        let candles = vec![candle(1.0, 1.1, 0.9, 1.0)];
        assert_eq!(sma(&candles, 5), Decimal8::ZERO);
    }

    #[test]
    fn atr_mean_basic() {
        let candles = vec![
            candle(1.0, 1.1, 0.9, 1.0),
            candle(1.0, 1.2, 0.8, 1.1),
        ];
        let atr = atr_mean(&candles, 2);
        // ranges: 0.2, 0.4 -> mean 0.3
        assert!((atr.to_f64() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn fractals_need_both_sides() {
        let candles: Vec<Candle> = (0..3).map(|i| candle(1.0, 1.0 + i as f64 * 0.1, 0.9, 1.0)).collect();
        let f = williams_fractals(&candles, 2);
        assert_eq!(f.up.len(), 3);
        assert!(f.up.iter().all(|&b| !b));
    }

    #[test]
    fn pct_change_zero_when_insufficient() {
        let candles = vec![candle(1.0, 1.0, 1.0, 1.0)];
        assert_eq!(pct_change(&candles, 5), Decimal8::ZERO);
    }
}
