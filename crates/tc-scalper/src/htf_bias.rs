//! Higher-timeframe bias: a directional lean computed from a higher
//! timeframe's EMA slope and position-in-range, cached on the bot for up
//! to an hour so every bar doesn't have to recompute it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tc_primitives::{indicators, Candle};

use crate::Direction;

const MIN_CANDLES: usize = 30;
const EMA_PERIOD: usize = 21;
const SLOPE_LOOKBACK: usize = 5;
const ATR_PERIOD: usize = 14;
const RANGE_LOOKBACK: usize = 30;
const SLOPE_THRESHOLD: f64 = 8e-5;
const POSITION_THRESHOLD: f64 = 0.55;
const CACHE_TTL_MINUTES: i64 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HtfBiasComponents {
    pub slope_pct: f64,
    pub atr_ratio: f64,
    pub position_in_range: f64,
}

/// Compute the higher-timeframe bias. `None` when there's insufficient
/// history or neither the buy nor sell thresholds are met.
pub fn analyze_htf_bias(candles: &[Candle]) -> Option<(Direction, HtfBiasComponents)> {
    if candles.len() < MIN_CANDLES {
        return None;
    }

    let ema_now = indicators::ema(candles, EMA_PERIOD);
    let ema_then = indicators::ema(&candles[..candles.len() - SLOPE_LOOKBACK], EMA_PERIOD);
    let last_close = candles.last().unwrap().close;
    if last_close.is_zero() {
        return None;
    }
    let slope_pct = (ema_now - ema_then).to_f64() / last_close.to_f64();

    let atr_now = indicators::atr_mean(candles, ATR_PERIOD);
    let atr_then = indicators::atr_mean(&candles[..candles.len() - SLOPE_LOOKBACK], ATR_PERIOD);
    let atr_ratio = if atr_then.is_zero() { 1.0 } else { atr_now.to_f64() / atr_then.to_f64() };

    let window = &candles[candles.len() - RANGE_LOOKBACK..];
    let range_high = indicators::highest_high(window, RANGE_LOOKBACK);
    let range_low = indicators::lowest_low(window, RANGE_LOOKBACK);
    let width = range_high.saturating_sub(range_low);
    let position_in_range = if width.is_zero() {
        0.5
    } else {
        (last_close - range_low).to_f64() / width.to_f64()
    };

    let components = HtfBiasComponents { slope_pct, atr_ratio, position_in_range };

    if slope_pct > SLOPE_THRESHOLD && position_in_range > POSITION_THRESHOLD {
        Some((Direction::Buy, components))
    } else if slope_pct < -SLOPE_THRESHOLD && position_in_range < 1.0 - POSITION_THRESHOLD {
        Some((Direction::Sell, components))
    } else {
        None
    }
}

/// The bias cached on a bot, re-used while fresh and while a fresh
/// computation returns `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedBias {
    pub direction: Direction,
    pub computed_at: DateTime<Utc>,
}

impl CachedBias {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.computed_at < Duration::minutes(CACHE_TTL_MINUTES)
    }
}

/// Resolve the bias to use for a bar: recompute, falling back to the cached
/// value when recomputation is null and the cache is still fresh.
pub fn resolve_bias(candles: &[Candle], cached: Option<&CachedBias>, now: DateTime<Utc>) -> Option<Direction> {
    if let Some((direction, _)) = analyze_htf_bias(candles) {
        return Some(direction);
    }
    cached.filter(|c| c.is_fresh(now)).map(|c| c.direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tc_primitives::Decimal8;

    fn rising_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let price = 1.0 + i as f64 * 0.001;
                Candle::new(
                    Utc.timestamp_opt(i as i64 * 60, 0).unwrap(),
                    Decimal8::from_f64(price),
                    Decimal8::from_f64(price + 0.0005),
                    Decimal8::from_f64(price - 0.0005),
                    Decimal8::from_f64(price),
                    100,
                )
            })
            .collect()
    }

    #[test]
    fn insufficient_candles_returns_none() {
        let candles = rising_candles(10);
        assert!(analyze_htf_bias(&candles).is_none());
    }

    #[test]
    fn steady_uptrend_near_range_high_gives_buy_bias() {
        let candles = rising_candles(40);
        let result = analyze_htf_bias(&candles);
        assert_eq!(result.map(|(d, _)| d), Some(Direction::Buy));
    }

    #[test]
    fn cache_expires_after_ttl() {
        let now = Utc::now();
        let cached = CachedBias {
            direction: Direction::Buy,
            computed_at: now - Duration::minutes(CACHE_TTL_MINUTES + 1),
        };
        assert!(!cached.is_fresh(now));
    }
}
