use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

use crate::error::DomainError;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Ack,
    Filled,
    PartFilled,
    Canceled,
    Error,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Error)
    }

    /// The allowed-transitions table from the data model:
    /// `new -> {ack, filled, error, canceled}`
    /// `ack -> {filled, part_filled, error, canceled}`
    /// `part_filled -> {filled, error, canceled}`
    /// terminal states have no outgoing transitions.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            New => matches!(next, Ack | Filled | Error | Canceled),
            Ack => matches!(next, Filled | PartFilled | Error | Canceled),
            PartFilled => matches!(next, Filled | Error | Canceled),
            Filled | Canceled | Error => false,
        }
    }
}

/// An order dispatched (or pending dispatch) to a broker. `client_order_id`
/// is the idempotency key the order orchestrator derives deterministically
/// from the originating decision — resubmitting the same decision never
/// creates a duplicate order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: uuid::Uuid,
    pub bot_id: uuid::Uuid,
    pub broker_account_id: uuid::Uuid,
    pub client_order_id: String,
    pub broker_order_id: Option<String>,
    pub symbol: String,
    pub side: OrderSide,
    pub qty: Decimal8,
    pub price: Option<Decimal8>,
    pub sl: Option<Decimal8>,
    pub tp: Option<Decimal8>,
    pub status: OrderStatus,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_close(&self) -> bool {
        self.client_order_id.starts_with("close|")
    }

    /// Apply a status transition, enforcing the allowed-transitions table.
    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::OrderState {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_allows_ack_and_terminal_states() {
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Ack));
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Filled));
        assert!(OrderStatus::New.can_transition_to(OrderStatus::Canceled));
        assert!(!OrderStatus::New.can_transition_to(OrderStatus::PartFilled));
    }

    #[test]
    fn terminal_states_reject_everything() {
        for s in [OrderStatus::Filled, OrderStatus::Canceled, OrderStatus::Error] {
            assert!(!s.can_transition_to(OrderStatus::Ack));
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn part_filled_cannot_revert_to_ack() {
        assert!(!OrderStatus::PartFilled.can_transition_to(OrderStatus::Ack));
        assert!(OrderStatus::PartFilled.can_transition_to(OrderStatus::Filled));
    }
}
