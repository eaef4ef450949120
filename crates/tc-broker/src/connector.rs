use tc_schemas::{Asset, BrokerAccount, Order};

use crate::types::{BrokerError, HealthReport, SubmitResult};

/// The contract every broker integration implements. `place_order` is
/// synchronous from the caller's point of view — it must leave the order in
/// a terminal-or-acked state before returning, never "fire and forget".
/// `account` and `asset` are passed alongside `order` rather than looked up
/// internally: the connector needs `account` to gate the call through its
/// own session/circuit-breaker bookkeeping, and `asset` to validate the
/// order against instrument-level limits before it reaches the wire.
pub trait BrokerConnector {
    fn place_order(&mut self, account: &BrokerAccount, asset: &Asset, order: &Order) -> Result<SubmitResult, BrokerError>;

    /// Idempotent: canceling an already-terminal order is a no-op success.
    fn cancel_order(&mut self, order: &Order) -> Result<(), BrokerError>;

    fn check_health(&mut self, account: &BrokerAccount, symbol: &str) -> Result<HealthReport, BrokerError>;

    fn login_for_account(&mut self, account: &BrokerAccount) -> Result<(), BrokerError>;
}
