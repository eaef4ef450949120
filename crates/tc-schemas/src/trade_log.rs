use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeLogStatus {
    New,
    Ack,
    Filled,
    PartFilled,
    Canceled,
    Error,
    Win,
    Loss,
    Breakeven,
}

/// An append-only record of an order status transition or terminal
/// outcome. Never updated or deleted once written; `pnl` is only populated
/// for the win/loss/breakeven outcome rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeLog {
    pub id: uuid::Uuid,
    pub order_id: uuid::Uuid,
    pub bot_id: uuid::Uuid,
    pub status: TradeLogStatus,
    pub pnl: Option<Decimal8>,
    pub recorded_at: DateTime<Utc>,
}
