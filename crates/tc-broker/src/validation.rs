//! Pre-send broker-level validation and SL/TP stop-level widening — run
//! before every live order placement, never for the paper adapter.

use tc_primitives::Decimal8;
use tc_schemas::Asset;

use crate::types::{BrokerError, SymbolInfo};

/// Runtime-wide order caps, layered on top of the per-asset limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrderCaps {
    pub max_order_notional: Decimal8,
    pub max_order_lot: Decimal8,
}

/// Validate qty/spread/notional for a new (non-close) order. Closes skip
/// the spread check since crossing the spread to exit is expected.
pub fn validate_open_order(
    asset: &Asset,
    symbol_info: &SymbolInfo,
    caps: &OrderCaps,
    qty: Decimal8,
    price: Decimal8,
) -> Result<(), BrokerError> {
    let min_lot = asset.effective_min_qty().max(symbol_info.volume_min);
    if qty < min_lot {
        return Err(BrokerError::Validation(format!("qty {qty} below broker minimum {min_lot}")));
    }

    if symbol_info.volume_step.is_positive() && qty.raw() % symbol_info.volume_step.raw() != 0 {
        return Err(BrokerError::Validation(format!(
            "qty {qty} is not a multiple of volume step {}",
            symbol_info.volume_step
        )));
    }

    if symbol_info.spread() > asset.max_spread {
        return Err(BrokerError::Validation(format!(
            "spread {} exceeds max {}",
            symbol_info.spread(),
            asset.max_spread
        )));
    }

    let notional = price.checked_mul(qty).unwrap_or(Decimal8::MAX).checked_mul(symbol_info.contract_size).unwrap_or(Decimal8::MAX);
    if notional < asset.min_notional {
        return Err(BrokerError::Validation(format!("notional {notional} below minimum {}", asset.min_notional)));
    }
    if notional > caps.max_order_notional {
        return Err(BrokerError::Validation(format!("notional {notional} exceeds cap {}", caps.max_order_notional)));
    }

    let lot_cap = caps.max_order_lot.max(min_lot);
    if qty > lot_cap {
        return Err(BrokerError::Validation(format!("qty {qty} exceeds lot cap {lot_cap}")));
    }

    Ok(())
}

/// Widen SL/TP to the broker's mandatory stop-level distance from the
/// current bid/ask, if the caller's requested distance is tighter.
pub fn widen_to_stops_level(
    symbol_info: &SymbolInfo,
    is_buy: bool,
    sl: Option<Decimal8>,
    tp: Option<Decimal8>,
) -> (Option<Decimal8>, Option<Decimal8>) {
    let min_distance = symbol_info.point.checked_mul(Decimal8::from_f64(symbol_info.stops_level_points)).unwrap_or(Decimal8::ZERO);
    if min_distance.is_zero() {
        return (sl, tp);
    }
    let reference = if is_buy { symbol_info.bid } else { symbol_info.ask };

    let widened_sl = sl.map(|v| {
        if is_buy {
            let max_sl = reference.saturating_sub(min_distance);
            v.min(max_sl)
        } else {
            let min_sl = reference.saturating_add(min_distance);
            v.max(min_sl)
        }
    });
    let widened_tp = tp.map(|v| {
        if is_buy {
            let min_tp = reference.saturating_add(min_distance);
            v.max(min_tp)
        } else {
            let max_tp = reference.saturating_sub(min_distance);
            v.min(max_tp)
        }
    });
    (widened_sl, widened_tp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset() -> Asset {
        Asset {
            symbol: "EURUSD".into(),
            category: tc_schemas::AssetCategory::Forex,
            min_qty: Decimal8::from_f64(0.01),
            recommended_qty: Decimal8::from_f64(0.1),
            max_spread: Decimal8::from_f64(0.0003),
            min_notional: Decimal8::from_int(100),
            is_active: true,
        }
    }

    fn symbol_info() -> SymbolInfo {
        SymbolInfo {
            volume_min: Decimal8::from_f64(0.01),
            volume_step: Decimal8::from_f64(0.01),
            stops_level_points: 50.0,
            point: Decimal8::from_f64(0.0001),
            trade_mode_disabled: false,
            contract_size: Decimal8::from_int(100_000),
            bid: Decimal8::from_f64(1.1000),
            ask: Decimal8::from_f64(1.1001),
        }
    }

    #[test]
    fn rejects_qty_below_broker_minimum() {
        let caps = OrderCaps { max_order_notional: Decimal8::from_int(1_000_000), max_order_lot: Decimal8::from_int(10) };
        let err = validate_open_order(&asset(), &symbol_info(), &caps, Decimal8::from_f64(0.001), Decimal8::from_f64(1.1)).unwrap_err();
        assert!(matches!(err, BrokerError::Validation(_)));
    }

    #[test]
    fn accepts_a_valid_order() {
        let caps = OrderCaps { max_order_notional: Decimal8::from_int(1_000_000), max_order_lot: Decimal8::from_int(10) };
        assert!(validate_open_order(&asset(), &symbol_info(), &caps, Decimal8::from_f64(0.1), Decimal8::from_f64(1.1)).is_ok());
    }

    #[test]
    fn widens_sl_that_is_too_close() {
        let (sl, _) = widen_to_stops_level(&symbol_info(), true, Some(Decimal8::from_f64(1.0999)), None);
        // min_distance = 50 * 0.0001 = 0.005; bid=1.1000 => max_sl=1.0950
        assert_eq!(sl, Some(Decimal8::from_f64(1.0950)));
    }
}
