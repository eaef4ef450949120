//! MT5 adapter.
//!
//! The real terminal connection is an FFI/IPC boundary this crate doesn't
//! own — [`Mt5Terminal`] is the seam a platform-specific implementation
//! plugs into. Everything this module does (single-session tracking,
//! readiness, hedging guard, validation, stop-level widening, retcode
//! mapping, the circuit breaker) is terminal-agnostic and lives here so it
//! is exercised the same way regardless of what's behind the trait.

use chrono::{DateTime, Utc};
use tc_primitives::Decimal8;
use tc_schemas::{Asset, BrokerAccount, Order, OrderSide};

use crate::circuit::CircuitBreaker;
use crate::connector::BrokerConnector;
use crate::hedging::check_hedging_guard;
use crate::types::{BrokerError, HealthReport, SubmitOutcome, SubmitResult, SymbolInfo};
use crate::validation::{validate_open_order, widen_to_stops_level, OrderCaps};

/// What submitting/canceling through the real terminal actually does.
/// Implemented against the platform's MT5 IPC bridge outside this crate.
pub trait Mt5Terminal {
    fn login(&mut self, login: &str, server: &str) -> Result<(), BrokerError>;
    fn symbol_info(&mut self, symbol: &str) -> Result<SymbolInfo, BrokerError>;
    fn readiness(&mut self, symbol: &str) -> Result<HealthReport, BrokerError>;
    fn net_position_qty(&mut self, symbol: &str) -> Result<Decimal8, BrokerError>;
    fn send_market_order(&mut self, order: &Order, sl: Option<Decimal8>, tp: Option<Decimal8>) -> Result<Mt5SendResult, BrokerError>;
    fn close_positions(&mut self, symbol: &str, side: OrderSide) -> Result<Mt5SendResult, BrokerError>;
    fn cancel(&mut self, broker_order_id: &str) -> Result<(), BrokerError>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Retcode {
    Done,
    DonePartial,
    Placed,
    Other(i32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mt5SendResult {
    pub retcode: Retcode,
    pub filled_qty: Decimal8,
    pub fill_price: Decimal8,
    pub account_balance_after: Option<Decimal8>,
    pub detail: String,
}

/// Map a terminal retcode to an order outcome per the contract: `DONE`/
/// `DONE_PARTIAL` fill, `PLACED` on a market order is unexpected (error),
/// anything else is an error carrying the retcode.
fn map_retcode(result: &Mt5SendResult) -> Result<SubmitOutcome, BrokerError> {
    match result.retcode {
        Retcode::Done | Retcode::DonePartial => Ok(SubmitOutcome::Filled { qty: result.filled_qty, price: result.fill_price }),
        Retcode::Placed => Err(BrokerError::Retcode { code: -1, detail: "PLACED unexpected for market order".into() }),
        Retcode::Other(code) => Err(BrokerError::Retcode { code, detail: result.detail.clone() }),
    }
}

pub struct Mt5Connector<T: Mt5Terminal> {
    terminal: T,
    current_session: Option<(String, String)>,
    hedging_enabled: bool,
    caps: OrderCaps,
    breaker: CircuitBreaker,
}

impl<T: Mt5Terminal> Mt5Connector<T> {
    pub fn new(terminal: T, hedging_enabled: bool, caps: OrderCaps) -> Self {
        Self {
            terminal,
            current_session: None,
            hedging_enabled,
            caps,
            breaker: CircuitBreaker::new(5, 300),
        }
    }

    fn guard_session(&mut self, account: &BrokerAccount, now: DateTime<Utc>) -> Result<(), BrokerError> {
        if self.breaker.is_open(&account.credentials, &account.broker_code, now) {
            return Err(BrokerError::CircuitOpen { login: account.credentials.clone(), server: account.broker_code.clone() });
        }
        let wanted = (account.credentials.clone(), account.broker_code.clone());
        if self.current_session.as_ref() != Some(&wanted) {
            self.terminal.login(&account.credentials, &account.broker_code)?;
            self.current_session = Some(wanted);
        }
        Ok(())
    }

    fn record_outcome<U>(&mut self, account: &BrokerAccount, now: DateTime<Utc>, result: &Result<U, BrokerError>) {
        match result {
            Ok(_) => self.breaker.record_success(&account.credentials, &account.broker_code),
            Err(_) => self.breaker.record_failure(&account.credentials, &account.broker_code, now),
        }
    }
}

impl<T: Mt5Terminal> BrokerConnector for Mt5Connector<T> {
    fn place_order(&mut self, account: &BrokerAccount, asset: &Asset, order: &Order) -> Result<SubmitResult, BrokerError> {
        let now = Utc::now();
        let result = (|| -> Result<SubmitResult, BrokerError> {
            self.guard_session(account, now)?;

            let readiness = self.terminal.readiness(&order.symbol)?;
            if !readiness.connected || !readiness.trade_allowed || !readiness.symbol_visible {
                return Err(BrokerError::Connectivity(format!("{} not ready for trading", order.symbol)));
            }

            if order.is_close() {
                let result = self.terminal.close_positions(&order.symbol, order.side)?;
                let outcome = map_retcode(&result)?;
                return Ok(SubmitResult { broker_order_id: order.client_order_id.clone(), outcome, account_balance_after: result.account_balance_after });
            }

            let net_qty = self.terminal.net_position_qty(&order.symbol)?;
            check_hedging_guard(self.hedging_enabled, net_qty, order.side == OrderSide::Buy)?;

            let info = self.terminal.symbol_info(&order.symbol)?;
            if info.trade_mode_disabled {
                return Err(BrokerError::Validation(format!("{} trade mode disabled", order.symbol)));
            }

            let reference_price = order.price.unwrap_or(if order.side == OrderSide::Buy { info.ask } else { info.bid });
            validate_open_order(asset, &info, &self.caps, order.qty, reference_price)?;

            let (sl, tp) = widen_to_stops_level(&info, order.side == OrderSide::Buy, order.sl, order.tp);

            let result = self.terminal.send_market_order(order, sl, tp)?;
            let outcome = map_retcode(&result)?;
            Ok(SubmitResult { broker_order_id: order.client_order_id.clone(), outcome, account_balance_after: result.account_balance_after })
        })();

        self.record_outcome(account, now, &result);
        result
    }

    fn cancel_order(&mut self, order: &Order) -> Result<(), BrokerError> {
        let broker_id = order.broker_order_id.clone().unwrap_or_else(|| order.client_order_id.clone());
        self.terminal.cancel(&broker_id)
    }

    fn check_health(&mut self, account: &BrokerAccount, symbol: &str) -> Result<HealthReport, BrokerError> {
        let now = Utc::now();
        self.guard_session(account, now)?;
        let result = self.terminal.readiness(symbol);
        self.record_outcome(account, now, &result);
        result
    }

    fn login_for_account(&mut self, account: &BrokerAccount) -> Result<(), BrokerError> {
        let now = Utc::now();
        self.guard_session(account, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::OrderStatus;
    use uuid::Uuid;

    struct FakeTerminal {
        ready: HealthReport,
        info: SymbolInfo,
        net_qty: Decimal8,
        send_result: Mt5SendResult,
    }

    impl Mt5Terminal for FakeTerminal {
        fn login(&mut self, _login: &str, _server: &str) -> Result<(), BrokerError> {
            Ok(())
        }
        fn symbol_info(&mut self, _symbol: &str) -> Result<SymbolInfo, BrokerError> {
            Ok(self.info)
        }
        fn readiness(&mut self, _symbol: &str) -> Result<HealthReport, BrokerError> {
            Ok(self.ready)
        }
        fn net_position_qty(&mut self, _symbol: &str) -> Result<Decimal8, BrokerError> {
            Ok(self.net_qty)
        }
        fn send_market_order(&mut self, _order: &Order, _sl: Option<Decimal8>, _tp: Option<Decimal8>) -> Result<Mt5SendResult, BrokerError> {
            Ok(self.send_result.clone())
        }
        fn close_positions(&mut self, _symbol: &str, _side: OrderSide) -> Result<Mt5SendResult, BrokerError> {
            Ok(self.send_result.clone())
        }
        fn cancel(&mut self, _broker_order_id: &str) -> Result<(), BrokerError> {
            Ok(())
        }
    }

    fn order() -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
            broker_account_id: Uuid::new_v4(),
            client_order_id: "abc123".into(),
            broker_order_id: None,
            symbol: "EURUSD".into(),
            side: OrderSide::Buy,
            qty: Decimal8::from_f64(0.1),
            price: None,
            sl: Some(Decimal8::from_f64(1.0950)),
            tp: Some(Decimal8::from_f64(1.1100)),
            status: OrderStatus::New,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn account() -> BrokerAccount {
        BrokerAccount {
            id: Uuid::new_v4(),
            broker_code: "mt5".into(),
            credentials: "login:server".into(),
            is_active: true,
            is_verified: true,
            base_currency: "USD".into(),
            leverage: 100,
        }
    }

    fn asset() -> Asset {
        Asset {
            symbol: "EURUSD".into(),
            category: tc_schemas::AssetCategory::Forex,
            min_qty: Decimal8::from_f64(0.01),
            recommended_qty: Decimal8::from_f64(0.1),
            max_spread: Decimal8::from_f64(0.01),
            min_notional: Decimal8::ZERO,
            is_active: true,
        }
    }

    fn symbol_info() -> SymbolInfo {
        SymbolInfo {
            volume_min: Decimal8::from_f64(0.01),
            volume_step: Decimal8::from_f64(0.01),
            stops_level_points: 50.0,
            point: Decimal8::from_f64(0.0001),
            trade_mode_disabled: false,
            contract_size: Decimal8::from_int(100_000),
            bid: Decimal8::from_f64(1.1000),
            ask: Decimal8::from_f64(1.1001),
        }
    }

    #[test]
    fn done_retcode_maps_to_filled() {
        let terminal = FakeTerminal {
            ready: HealthReport::healthy(),
            info: symbol_info(),
            net_qty: Decimal8::ZERO,
            send_result: Mt5SendResult {
                retcode: Retcode::Done,
                filled_qty: Decimal8::from_f64(0.1),
                fill_price: Decimal8::from_f64(1.1001),
                account_balance_after: Some(Decimal8::from_int(10_000)),
                detail: "ok".into(),
            },
        };
        let caps = OrderCaps { max_order_notional: Decimal8::from_int(1_000_000), max_order_lot: Decimal8::from_int(10) };
        let mut conn = Mt5Connector::new(terminal, false, caps);
        let result = conn.place_order(&account(), &asset(), &order()).unwrap();
        assert!(matches!(result.outcome, SubmitOutcome::Filled { .. }));
    }

    #[test]
    fn placed_retcode_on_market_order_is_an_error() {
        let terminal = FakeTerminal {
            ready: HealthReport::healthy(),
            info: symbol_info(),
            net_qty: Decimal8::ZERO,
            send_result: Mt5SendResult {
                retcode: Retcode::Placed,
                filled_qty: Decimal8::ZERO,
                fill_price: Decimal8::ZERO,
                account_balance_after: None,
                detail: "placed".into(),
            },
        };
        let caps = OrderCaps { max_order_notional: Decimal8::from_int(1_000_000), max_order_lot: Decimal8::from_int(10) };
        let mut conn = Mt5Connector::new(terminal, false, caps);
        assert!(conn.place_order(&account(), &asset(), &order()).is_err());
    }

    #[test]
    fn hedging_disabled_blocks_opposite_direction() {
        let terminal = FakeTerminal {
            ready: HealthReport::healthy(),
            info: symbol_info(),
            net_qty: Decimal8::from_int(-1),
            send_result: Mt5SendResult {
                retcode: Retcode::Done,
                filled_qty: Decimal8::from_f64(0.1),
                fill_price: Decimal8::from_f64(1.1001),
                account_balance_after: None,
                detail: "ok".into(),
            },
        };
        let caps = OrderCaps { max_order_notional: Decimal8::from_int(1_000_000), max_order_lot: Decimal8::from_int(10) };
        let mut conn = Mt5Connector::new(terminal, false, caps);
        let err = conn.place_order(&account(), &asset(), &order()).unwrap_err();
        assert!(matches!(err, BrokerError::HedgingViolation(_)));
    }
}
