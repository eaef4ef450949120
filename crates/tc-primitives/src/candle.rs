use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Decimal8;

/// One OHLCV bar. `tick_volume` is the broker's tick count, not a
/// notional-weighted volume — callers must not treat it as liquidity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: Decimal8,
    pub high: Decimal8,
    pub low: Decimal8,
    pub close: Decimal8,
    pub tick_volume: i64,
}

impl Candle {
    pub fn new(
        time: DateTime<Utc>,
        open: Decimal8,
        high: Decimal8,
        low: Decimal8,
        close: Decimal8,
        tick_volume: i64,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            tick_volume,
        }
    }

    /// `high - low`, the bar's range. Never negative for well-formed candles.
    pub fn range(&self) -> Decimal8 {
        self.high.saturating_sub(self.low)
    }

    /// `|close - open|`.
    pub fn body(&self) -> Decimal8 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    /// Wick above the body.
    pub fn upper_wick(&self) -> Decimal8 {
        let body_top = self.open.max(self.close);
        self.high.saturating_sub(body_top)
    }

    /// Wick below the body.
    pub fn lower_wick(&self) -> Decimal8 {
        let body_bottom = self.open.min(self.close);
        body_bottom.saturating_sub(self.low)
    }
}
