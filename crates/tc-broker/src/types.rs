use tc_primitives::Decimal8;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BrokerError {
    #[error("connectivity error: {0}")]
    Connectivity(String),
    #[error("circuit breaker open for {login}@{server}")]
    CircuitOpen { login: String, server: String },
    #[error("hedging violation: {0}")]
    HedgingViolation(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("broker retcode {code}: {detail}")]
    Retcode { code: i32, detail: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The order cleared immediately — record the fill now.
    Filled { qty: Decimal8, price: Decimal8 },
    /// Accepted by the broker but not yet filled.
    Acked,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmitResult {
    pub broker_order_id: String,
    pub outcome: SubmitOutcome,
    pub account_balance_after: Option<Decimal8>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthReport {
    pub connected: bool,
    pub trade_allowed: bool,
    pub symbol_visible: bool,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self { connected: true, trade_allowed: true, symbol_visible: true }
    }
}

/// Broker-reported facts about a tradable symbol, used by the validation
/// and SL/TP-widening steps before any order reaches the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SymbolInfo {
    pub volume_min: Decimal8,
    pub volume_step: Decimal8,
    pub stops_level_points: f64,
    pub point: Decimal8,
    pub trade_mode_disabled: bool,
    pub contract_size: Decimal8,
    pub bid: Decimal8,
    pub ask: Decimal8,
}

impl SymbolInfo {
    pub fn spread(&self) -> Decimal8 {
        self.ask.saturating_sub(self.bid)
    }
}
