//! SL/TP fallback for decisions that didn't carry explicit params — a
//! volatility-scaled distance off the live mid-price, floored by a
//! percent-of-price minimum so a flat-ATR symbol still gets a sane bracket.

use tc_primitives::Decimal8;
use tc_schemas::OrderSide;

fn pct_of(price: Decimal8, pct: f64) -> Decimal8 {
    price.checked_mul(Decimal8::from_f64(pct)).unwrap_or(Decimal8::ZERO)
}

fn atr_scaled(atr: Option<Decimal8>, multiple: f64) -> Option<Decimal8> {
    atr.map(|a| a.checked_mul(Decimal8::from_f64(multiple)).unwrap_or(Decimal8::ZERO))
}

/// `SL = p ∓ max(1.2·ATR, 0.25%·p)`, `TP = p ± max(1.8·ATR, 0.35%·p)`,
/// sign chosen by order side (buy widens SL below and TP above mid).
pub fn fallback_brackets(side: OrderSide, mid_price: Decimal8, atr: Option<Decimal8>) -> (Decimal8, Decimal8) {
    let sl_distance = atr_scaled(atr, 1.2).unwrap_or(Decimal8::ZERO).max(pct_of(mid_price, 0.0025));
    let tp_distance = atr_scaled(atr, 1.8).unwrap_or(Decimal8::ZERO).max(pct_of(mid_price, 0.0035));
    match side {
        OrderSide::Buy => (mid_price.saturating_sub(sl_distance), mid_price.saturating_add(tp_distance)),
        OrderSide::Sell => (mid_price.saturating_add(sl_distance), mid_price.saturating_sub(tp_distance)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_sl_is_below_mid_and_tp_is_above() {
        let (sl, tp) = fallback_brackets(OrderSide::Buy, Decimal8::from_f64(1.1000), Some(Decimal8::from_f64(0.001)));
        assert!(sl < Decimal8::from_f64(1.1000));
        assert!(tp > Decimal8::from_f64(1.1000));
    }

    #[test]
    fn without_atr_the_percent_floor_applies() {
        let (sl, tp) = fallback_brackets(OrderSide::Sell, Decimal8::from_f64(100.0), None);
        // 0.25% of 100 = 0.25
        assert_eq!(sl, Decimal8::from_f64(100.25));
        assert_eq!(tp, Decimal8::from_f64(99.65));
    }
}
