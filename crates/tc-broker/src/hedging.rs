use tc_primitives::Decimal8;

use crate::types::BrokerError;

/// Guard new-position opens against a hedging-disabled account: reject if
/// the requested direction is opposite the current net exposure, or if the
/// account somehow already carries both long and short on the symbol.
pub fn check_hedging_guard(
    hedging_enabled: bool,
    net_position_qty: Decimal8,
    is_buy: bool,
) -> Result<(), BrokerError> {
    if hedging_enabled {
        return Ok(());
    }
    if net_position_qty.is_zero() {
        return Ok(());
    }
    let position_is_long = net_position_qty.is_positive();
    if position_is_long != is_buy {
        return Err(BrokerError::HedgingViolation(
            "opposite-direction open rejected on hedging-disabled account".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_direction_is_allowed() {
        assert!(check_hedging_guard(false, Decimal8::from_int(1), true).is_ok());
    }

    #[test]
    fn opposite_direction_is_rejected_when_hedging_disabled() {
        assert!(check_hedging_guard(false, Decimal8::from_int(1), false).is_err());
    }

    #[test]
    fn opposite_direction_allowed_when_hedging_enabled() {
        assert!(check_hedging_guard(true, Decimal8::from_int(1), false).is_ok());
    }
}
