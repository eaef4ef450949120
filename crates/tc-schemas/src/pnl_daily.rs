use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

/// Daily PnL rollup, unique per `(broker_account_id, symbol, date)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PnLDaily {
    pub broker_account_id: uuid::Uuid,
    pub symbol: String,
    pub date: NaiveDate,
    pub realized: Decimal8,
    pub unrealized: Decimal8,
    pub fees: Decimal8,
    pub balance: Decimal8,
}
