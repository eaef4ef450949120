//! An in-memory `BrokerConnector` double. Unlike `tc_broker::PaperBroker`
//! (which models fill timing against a price feed) this is a bookkeeping
//! stub for tests that only need to assert "an order was submitted" or
//! drive a specific `BrokerError` — health checks, circuit-breaker paths,
//! idempotent resubmission after a crash. Repeated `place_order` calls for
//! the same `client_order_id` return the first result without creating a
//! second ticket, the same idempotency convention the teacher's fake broker
//! enforces by key.

use std::collections::HashMap;

use tc_broker::{BrokerConnector, BrokerError, HealthReport, SubmitOutcome, SubmitResult};
use tc_primitives::Decimal8;
use tc_schemas::{Asset, BrokerAccount, Order};

pub struct FakeBroker {
    tickets: HashMap<String, SubmitResult>,
    submit_calls: usize,
    cancel_calls: usize,
    health: HealthReport,
    fail_next_submit: Option<BrokerError>,
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBroker {
    pub fn new() -> Self {
        Self { tickets: HashMap::new(), submit_calls: 0, cancel_calls: 0, health: HealthReport::healthy(), fail_next_submit: None }
    }

    pub fn with_health(mut self, health: HealthReport) -> Self {
        self.health = health;
        self
    }

    /// The next `place_order` call returns this error instead of filling.
    pub fn fail_next_submit_with(&mut self, err: BrokerError) {
        self.fail_next_submit = Some(err);
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls
    }

    pub fn cancel_count(&self) -> usize {
        self.cancel_calls
    }

    pub fn has_ticket(&self, client_order_id: &str) -> bool {
        self.tickets.contains_key(client_order_id)
    }
}

impl BrokerConnector for FakeBroker {
    fn place_order(&mut self, _account: &BrokerAccount, _asset: &Asset, order: &Order) -> Result<SubmitResult, BrokerError> {
        if let Some(existing) = self.tickets.get(&order.client_order_id) {
            return Ok(existing.clone());
        }

        self.submit_calls += 1;
        if let Some(err) = self.fail_next_submit.take() {
            return Err(err);
        }

        let result = SubmitResult {
            broker_order_id: format!("FAKE-{}", self.submit_calls),
            outcome: SubmitOutcome::Filled { qty: order.qty, price: order.price.unwrap_or(Decimal8::ZERO) },
            account_balance_after: None,
        };
        self.tickets.insert(order.client_order_id.clone(), result.clone());
        Ok(result)
    }

    fn cancel_order(&mut self, _order: &Order) -> Result<(), BrokerError> {
        self.cancel_calls += 1;
        Ok(())
    }

    fn check_health(&mut self, _account: &BrokerAccount, _symbol: &str) -> Result<HealthReport, BrokerError> {
        Ok(self.health)
    }

    fn login_for_account(&mut self, _account: &BrokerAccount) -> Result<(), BrokerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use chrono::Utc;
    use tc_schemas::OrderSide;
    use uuid::Uuid;

    #[test]
    fn resubmitting_the_same_client_order_id_does_not_double_submit() {
        let mut broker = FakeBroker::new();
        let account = fixtures::broker_account();
        let asset = fixtures::asset("EURUSD");
        let order = fixtures::order(Uuid::new_v4(), Uuid::new_v4(), "EURUSD", OrderSide::Buy, Decimal8::from_f64(0.1), Utc::now());

        let first = broker.place_order(&account, &asset, &order).unwrap();
        let second = broker.place_order(&account, &asset, &order).unwrap();

        assert_eq!(first, second);
        assert_eq!(broker.submit_count(), 1);
    }

    #[test]
    fn fail_next_submit_surfaces_once_then_clears() {
        let mut broker = FakeBroker::new();
        broker.fail_next_submit_with(BrokerError::Connectivity("down".to_string()));
        let account = fixtures::broker_account();
        let asset = fixtures::asset("EURUSD");
        let order = fixtures::order(Uuid::new_v4(), Uuid::new_v4(), "EURUSD", OrderSide::Buy, Decimal8::from_f64(0.1), Utc::now());

        assert!(broker.place_order(&account, &asset, &order).is_err());
        let order_retry = fixtures::order(Uuid::new_v4(), Uuid::new_v4(), "EURUSD", OrderSide::Buy, Decimal8::from_f64(0.1), Utc::now());
        assert!(broker.place_order(&account, &asset, &order_retry).is_ok());
    }
}
