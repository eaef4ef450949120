use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

/// One fill against an order. `account_balance_after` is optional because
/// paper fills and some broker callbacks don't carry a balance snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: uuid::Uuid,
    pub order_id: uuid::Uuid,
    pub qty: Decimal8,
    pub price: Decimal8,
    pub fee: Decimal8,
    pub exec_time: DateTime<Utc>,
    pub account_balance_after: Option<Decimal8>,
}
