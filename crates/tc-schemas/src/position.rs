use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// A broker position, unique per `(broker_account_id, symbol)`. `qty` is
/// signed: positive is long, negative is short, zero is flat.
///
/// Invariant: `qty == 0` implies `status == Closed`, `avg_price == ZERO`,
/// and `sl`/`tp` are both `None`. [`Position::close`] is the only way to
/// reach that state from outside this module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: uuid::Uuid,
    pub broker_account_id: uuid::Uuid,
    pub symbol: String,
    pub qty: Decimal8,
    pub avg_price: Decimal8,
    pub sl: Option<Decimal8>,
    pub tp: Option<Decimal8>,
    pub status: PositionStatus,
}

impl Position {
    pub fn flat(broker_account_id: uuid::Uuid, symbol: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            broker_account_id,
            symbol: symbol.into(),
            qty: Decimal8::ZERO,
            avg_price: Decimal8::ZERO,
            sl: None,
            tp: None,
            status: PositionStatus::Closed,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.qty.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.qty.is_positive()
    }

    pub fn is_short(&self) -> bool {
        self.qty.is_negative()
    }

    /// Force the closed-position invariant. Called once `qty` reaches zero.
    pub fn close(&mut self) {
        self.qty = Decimal8::ZERO;
        self.avg_price = Decimal8::ZERO;
        self.sl = None;
        self.tp = None;
        self.status = PositionStatus::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_clears_avg_price_and_brackets() {
        let mut p = Position {
            id: uuid::Uuid::new_v4(),
            broker_account_id: uuid::Uuid::new_v4(),
            symbol: "EURUSD".into(),
            qty: Decimal8::from_int(1),
            avg_price: Decimal8::from_f64(1.1),
            sl: Some(Decimal8::from_f64(1.05)),
            tp: Some(Decimal8::from_f64(1.2)),
            status: PositionStatus::Open,
        };
        p.close();
        assert!(p.is_flat());
        assert_eq!(p.avg_price, Decimal8::ZERO);
        assert!(p.sl.is_none() && p.tp.is_none());
        assert_eq!(p.status, PositionStatus::Closed);
    }
}
