//! Stale-order cancellation: orders sitting in `new`/`ack` past the
//! acknowledgment timeout are auto-canceled rather than left to rot.

use chrono::{DateTime, Utc};
use tc_schemas::{Order, OrderStatus};

pub const STALE_CANCEL_REASON: &str = "auto-cancel: stale new/ack";

pub fn is_stale(order: &Order, now: DateTime<Utc>, order_ack_timeout_seconds: i64) -> bool {
    matches!(order.status, OrderStatus::New | OrderStatus::Ack) && (now - order.updated_at).num_seconds() >= order_ack_timeout_seconds
}

/// Cancel `order` in place if stale, recording the standard reason.
pub fn cancel_if_stale(order: &mut Order, now: DateTime<Utc>, order_ack_timeout_seconds: i64) -> bool {
    if !is_stale(order, now, order_ack_timeout_seconds) {
        return false;
    }
    order.last_error = Some(STALE_CANCEL_REASON.to_string());
    let _ = order.transition(OrderStatus::Canceled, now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tc_primitives::Decimal8;
    use tc_schemas::OrderSide;
    use uuid::Uuid;

    fn order(status: OrderStatus, updated_at: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
            broker_account_id: Uuid::new_v4(),
            client_order_id: "x".into(),
            broker_order_id: None,
            symbol: "EURUSD".into(),
            side: OrderSide::Buy,
            qty: Decimal8::from_f64(0.1),
            price: None,
            sl: None,
            tp: None,
            status,
            last_error: None,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn ack_past_timeout_is_canceled() {
        let now = Utc::now();
        let mut o = order(OrderStatus::Ack, now - Duration::seconds(120));
        assert!(cancel_if_stale(&mut o, now, 60));
        assert_eq!(o.status, OrderStatus::Canceled);
        assert_eq!(o.last_error.as_deref(), Some(STALE_CANCEL_REASON));
    }

    #[test]
    fn recent_ack_is_left_alone() {
        let now = Utc::now();
        let mut o = order(OrderStatus::Ack, now - Duration::seconds(10));
        assert!(!cancel_if_stale(&mut o, now, 60));
        assert_eq!(o.status, OrderStatus::Ack);
    }

    #[test]
    fn filled_orders_are_never_considered_stale() {
        let now = Utc::now();
        let o = order(OrderStatus::Filled, now - Duration::seconds(1000));
        assert!(!is_stale(&o, now, 60));
    }
}
