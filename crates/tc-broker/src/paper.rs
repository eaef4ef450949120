//! Deterministic in-memory paper broker: ACKs immediately, then a
//! deterministic fill becomes due after a configurable delay at a fixed
//! mock price. No randomness, no wall-clock reads beyond the `now` the
//! caller supplies to `drain_due_fills`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tc_primitives::Decimal8;
use tc_schemas::{Asset, BrokerAccount, Order, OrderSide};

use crate::connector::BrokerConnector;
use crate::types::{BrokerError, HealthReport, SubmitOutcome, SubmitResult};

#[derive(Clone, Debug, PartialEq)]
struct PendingFill {
    due_at: DateTime<Utc>,
    price: Decimal8,
    qty: Decimal8,
    symbol: String,
    side: OrderSide,
}

pub struct PaperBroker {
    fill_delay: Duration,
    mock_price: Decimal8,
    pending: BTreeMap<String, PendingFill>,
    canceled: BTreeMap<String, bool>,
}

impl PaperBroker {
    pub fn new(fill_delay_seconds: i64, mock_price: Decimal8) -> Self {
        Self {
            fill_delay: Duration::seconds(fill_delay_seconds),
            mock_price,
            pending: BTreeMap::new(),
            canceled: BTreeMap::new(),
        }
    }

    /// A deterministic fill report for every client_order_id whose delay
    /// has elapsed by `now`. Callers advance orders to `filled` from this.
    pub fn drain_due_fills(&mut self, now: DateTime<Utc>) -> Vec<(String, Decimal8, Decimal8)> {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(id, fill)| fill.due_at <= now && !self.canceled.contains_key(*id))
            .map(|(id, _)| id.clone())
            .collect();
        due.into_iter()
            .filter_map(|id| self.pending.remove(&id).map(|f| (id, f.qty, f.price)))
            .collect()
    }

    /// Tickets this in-memory broker still believes are open (acked but not
    /// yet filled or canceled): `(client_order_id, symbol, side, qty)`.
    /// Exists so a long-running holder of this broker can compare its own
    /// bookkeeping against the database's idea of the same orders after a
    /// restart — the in-memory state here does not survive a process
    /// crash, the database does.
    pub fn open_tickets(&self) -> Vec<(String, String, OrderSide, Decimal8)> {
        self.pending.iter().map(|(id, fill)| (id.clone(), fill.symbol.clone(), fill.side, fill.qty)).collect()
    }
}

impl BrokerConnector for PaperBroker {
    fn place_order(&mut self, _account: &BrokerAccount, _asset: &Asset, order: &Order) -> Result<SubmitResult, BrokerError> {
        if !self.pending.contains_key(&order.client_order_id) {
            self.pending.insert(
                order.client_order_id.clone(),
                PendingFill {
                    due_at: order.created_at + self.fill_delay,
                    price: self.mock_price,
                    qty: order.qty,
                    symbol: order.symbol.clone(),
                    side: order.side,
                },
            );
        }
        Ok(SubmitResult {
            broker_order_id: order.client_order_id.clone(),
            outcome: SubmitOutcome::Acked,
            account_balance_after: None,
        })
    }

    fn cancel_order(&mut self, order: &Order) -> Result<(), BrokerError> {
        self.canceled.insert(order.client_order_id.clone(), true);
        self.pending.remove(&order.client_order_id);
        Ok(())
    }

    fn check_health(&mut self, _account: &BrokerAccount, _symbol: &str) -> Result<HealthReport, BrokerError> {
        Ok(HealthReport::healthy())
    }

    fn login_for_account(&mut self, _account: &BrokerAccount) -> Result<(), BrokerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::{AssetCategory, OrderSide, OrderStatus};
    use uuid::Uuid;

    fn account() -> BrokerAccount {
        BrokerAccount {
            id: Uuid::new_v4(),
            broker_code: "paper".into(),
            credentials: "n/a".into(),
            is_active: true,
            is_verified: true,
            base_currency: "USD".into(),
            leverage: 100,
        }
    }

    fn asset() -> Asset {
        Asset {
            symbol: "EURUSD".into(),
            category: AssetCategory::Forex,
            min_qty: Decimal8::from_f64(0.01),
            recommended_qty: Decimal8::from_f64(0.1),
            max_spread: Decimal8::from_f64(0.01),
            min_notional: Decimal8::ZERO,
            is_active: true,
        }
    }

    fn order(id: &str, now: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
            broker_account_id: Uuid::new_v4(),
            client_order_id: id.to_string(),
            broker_order_id: None,
            symbol: "EURUSD".into(),
            side: OrderSide::Buy,
            qty: Decimal8::from_f64(0.1),
            price: None,
            sl: None,
            tp: None,
            status: OrderStatus::New,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fill_becomes_due_after_delay() {
        let now = Utc::now();
        let mut broker = PaperBroker::new(5, Decimal8::from_f64(1.1));
        broker.place_order(&account(), &asset(), &order("a", now)).unwrap();
        assert!(broker.drain_due_fills(now + Duration::seconds(1)).is_empty());
        let fills = broker.drain_due_fills(now + Duration::seconds(6));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].0, "a");
    }

    #[test]
    fn canceled_order_never_fills() {
        let now = Utc::now();
        let mut broker = PaperBroker::new(5, Decimal8::from_f64(1.1));
        let ord = order("a", now);
        broker.place_order(&account(), &asset(), &ord).unwrap();
        broker.cancel_order(&ord).unwrap();
        assert!(broker.drain_due_fills(now + Duration::seconds(10)).is_empty());
    }

    #[test]
    fn resubmitting_same_client_order_id_is_idempotent() {
        let now = Utc::now();
        let mut broker = PaperBroker::new(5, Decimal8::from_f64(1.1));
        broker.place_order(&account(), &asset(), &order("a", now)).unwrap();
        broker.place_order(&account(), &asset(), &order("a", now)).unwrap();
        assert_eq!(broker.pending.len(), 1);
    }
}
