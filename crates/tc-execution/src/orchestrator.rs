//! Order orchestrator: turns a `Decision` (or a position that needs
//! closing) into an `Order`, deterministically keyed so resubmitting the
//! same decision never creates a duplicate, then dispatches it through a
//! [`BrokerConnector`] and records the resulting status transition.

use chrono::{DateTime, Utc};
use tc_broker::BrokerConnector;
use tc_primitives::Decimal8;
use tc_schemas::{Asset, BrokerAccount, Decision, DecisionAction, Order, OrderSide, OrderStatus, Position, TradeLog, TradeLogStatus};
use tracing::warn;
use uuid::Uuid;

use crate::bracket::fallback_brackets;
use crate::keys::{close_order_key, open_order_key};

/// What the caller needs to find an existing non-terminal order on the
/// same account/symbol before opening a new one, so the cooldown check in
/// [`should_skip_for_cooldown`] has something to compare against.
#[derive(Clone, Copy, Debug)]
pub struct RecentOrder {
    pub updated_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Build (or refresh) the open order for a decision. Returns `None` if the
/// decision isn't an open (callers should use [`create_close_from_position`]
/// for closes).
pub fn create_from_decision(
    decision: &Decision,
    account_id: Uuid,
    symbol: &str,
    side: OrderSide,
    now: DateTime<Utc>,
    existing: Option<Order>,
    mid_price: Decimal8,
    atr: Option<Decimal8>,
) -> Order {
    let client_order_id = open_order_key(&decision.id, &account_id, symbol, "open");
    let qty = decision.params.qty.unwrap_or(Decimal8::ZERO);

    let (sl, tp) = match (decision.params.sl, decision.params.tp) {
        (Some(sl), Some(tp)) => (Some(sl), Some(tp)),
        (sl, tp) => {
            let (fallback_sl, fallback_tp) = fallback_brackets(side, mid_price, atr);
            let resolved_sl = sl.or(Some(fallback_sl));
            let resolved_tp = tp.or(Some(fallback_tp));
            if resolved_sl.is_none() || resolved_tp.is_none() {
                warn!(decision_id = %decision.id, "order missing SL/TP after fallback computation");
            }
            (resolved_sl, resolved_tp)
        }
    };

    match existing {
        Some(mut order) => {
            order.sl = sl;
            order.tp = tp;
            order.qty = qty;
            order.updated_at = now;
            order
        }
        None => Order {
            id: Uuid::new_v4(),
            bot_id: decision.bot_id,
            broker_account_id: account_id,
            client_order_id,
            broker_order_id: None,
            symbol: symbol.to_string(),
            side,
            qty,
            price: None,
            sl,
            tp,
            status: OrderStatus::New,
            last_error: None,
            created_at: now,
            updated_at: now,
        },
    }
}

/// Build (or refresh) the close order for a position. If a prior close
/// order exists with stale qty/side or sits in a terminal state, it is
/// reset to `new` and given fresh qty/side rather than left to rot.
pub fn create_close_from_position(position: &Position, now: DateTime<Utc>, existing: Option<Order>) -> Order {
    let client_order_id = close_order_key(&position.id, &position.broker_account_id, &position.symbol);
    let side = if position.is_long() { OrderSide::Sell } else { OrderSide::Buy };
    let qty = position.qty.abs();

    match existing {
        Some(mut order) => {
            let stale = order.qty != qty || order.side != side || order.status.is_terminal();
            if stale {
                order.qty = qty;
                order.side = side;
                order.status = OrderStatus::New;
                order.last_error = None;
                order.updated_at = now;
            }
            order
        }
        None => Order {
            id: Uuid::new_v4(),
            bot_id: Uuid::nil(),
            broker_account_id: position.broker_account_id,
            client_order_id,
            broker_order_id: None,
            symbol: position.symbol.clone(),
            side,
            qty,
            price: None,
            sl: None,
            tp: None,
            status: OrderStatus::New,
            last_error: None,
            created_at: now,
            updated_at: now,
        },
    }
}

/// Whether fanout should skip dispatch because a non-terminal order on the
/// same `(account, symbol)` was updated within the cooldown window.
pub fn should_skip_for_cooldown(
    recent: Option<RecentOrder>,
    now: DateTime<Utc>,
    decision_order_cooldown_sec: i64,
    timeframe_seconds: i64,
) -> bool {
    let window = decision_order_cooldown_sec.max(timeframe_seconds);
    match recent {
        Some(r) if !r.status.is_terminal() => (now - r.updated_at).num_seconds() < window,
        _ => false,
    }
}

/// What to do with an existing non-terminal/terminal order for the same
/// decision, found by `client_order_id`, before dispatching.
pub enum RedispatchPlan {
    /// Reuse as-is, no broker call.
    ReuseInFlight,
    /// Reset to `new` and dispatch.
    Redispatch(Order),
    /// Already filled/error-handled elsewhere; do nothing this cycle.
    Skip,
}

pub fn plan_redispatch(mut order: Order, now: DateTime<Utc>) -> RedispatchPlan {
    match order.status {
        OrderStatus::New | OrderStatus::Ack => RedispatchPlan::ReuseInFlight,
        OrderStatus::Canceled | OrderStatus::Error => {
            order.status = OrderStatus::New;
            order.last_error = None;
            order.updated_at = now;
            RedispatchPlan::Redispatch(order)
        }
        OrderStatus::Filled | OrderStatus::PartFilled => RedispatchPlan::Skip,
    }
}

/// Dispatch `order` through `broker`, applying the returned outcome as a
/// status transition and emitting the corresponding `TradeLog` row.
pub fn dispatch<B: BrokerConnector>(
    broker: &mut B,
    account: &BrokerAccount,
    asset: &Asset,
    order: &mut Order,
    now: DateTime<Utc>,
) -> (TradeLog, Option<(Decimal8, Decimal8)>) {
    let fill = match broker.place_order(account, asset, order) {
        Ok(result) => {
            let next = match result.outcome {
                tc_broker::SubmitOutcome::Filled { .. } => OrderStatus::Filled,
                tc_broker::SubmitOutcome::Acked => OrderStatus::Ack,
            };
            if let Err(e) = order.transition(next, now) {
                warn!(order_id = %order.id, error = %e, "order transition rejected");
            }
            order.broker_order_id = Some(result.broker_order_id);
            match result.outcome {
                tc_broker::SubmitOutcome::Filled { qty, price } => Some((qty, price)),
                tc_broker::SubmitOutcome::Acked => None,
            }
        }
        Err(e) => {
            order.last_error = Some(e.to_string());
            if let Err(transition_err) = order.transition(OrderStatus::Error, now) {
                warn!(order_id = %order.id, error = %transition_err, "order transition rejected");
            }
            None
        }
    };

    let status = match order.status {
        OrderStatus::New => TradeLogStatus::New,
        OrderStatus::Ack => TradeLogStatus::Ack,
        OrderStatus::Filled => TradeLogStatus::Filled,
        OrderStatus::PartFilled => TradeLogStatus::PartFilled,
        OrderStatus::Canceled => TradeLogStatus::Canceled,
        OrderStatus::Error => TradeLogStatus::Error,
    };

    let log = TradeLog { id: Uuid::new_v4(), order_id: order.id, bot_id: order.bot_id, status, pnl: None, recorded_at: now };
    (log, fill)
}

pub fn is_open_decision(decision: &Decision) -> bool {
    decision.action == DecisionAction::Open
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_from_decision_without_params_uses_fallback_brackets() {
        let decision = Decision {
            id: Uuid::new_v4(),
            signal_id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
            action: DecisionAction::Open,
            reason: "test".into(),
            score: 0.9,
            params: tc_schemas::DecisionParams { qty: Some(Decimal8::from_f64(0.1)), ..Default::default() },
        };
        let now = Utc::now();
        let order = create_from_decision(&decision, Uuid::new_v4(), "EURUSD", OrderSide::Buy, now, None, Decimal8::from_f64(1.1), None);
        assert!(order.sl.is_some());
        assert!(order.tp.is_some());
        assert!(order.sl.unwrap() < Decimal8::from_f64(1.1));
    }

    #[test]
    fn resubmitting_the_same_decision_produces_the_same_client_order_id() {
        let decision = Decision {
            id: Uuid::new_v4(),
            signal_id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
            action: DecisionAction::Open,
            reason: "test".into(),
            score: 0.9,
            params: tc_schemas::DecisionParams::default(),
        };
        let account = Uuid::new_v4();
        let a = create_from_decision(&decision, account, "EURUSD", OrderSide::Buy, Utc::now(), None, Decimal8::from_f64(1.1), None);
        let b = create_from_decision(&decision, account, "EURUSD", OrderSide::Buy, Utc::now(), None, Decimal8::from_f64(1.1), None);
        assert_eq!(a.client_order_id, b.client_order_id);
    }

    #[test]
    fn stale_close_order_is_reset_to_new() {
        let position = Position {
            id: Uuid::new_v4(),
            broker_account_id: Uuid::new_v4(),
            symbol: "EURUSD".into(),
            qty: Decimal8::from_f64(0.5),
            avg_price: Decimal8::from_f64(1.1),
            sl: None,
            tp: None,
            status: tc_schemas::PositionStatus::Open,
        };
        let now = Utc::now();
        let mut stale = create_close_from_position(&position, now, None);
        stale.status = OrderStatus::Error;
        stale.qty = Decimal8::from_f64(0.2);
        let refreshed = create_close_from_position(&position, now, Some(stale));
        assert_eq!(refreshed.status, OrderStatus::New);
        assert_eq!(refreshed.qty, Decimal8::from_f64(0.5));
    }

    #[test]
    fn cooldown_blocks_within_window_and_allows_after() {
        let now = Utc::now();
        let recent = RecentOrder { updated_at: now - chrono::Duration::seconds(10), status: OrderStatus::Ack };
        assert!(should_skip_for_cooldown(Some(recent), now, 30, 60));
        assert!(!should_skip_for_cooldown(Some(recent), now + chrono::Duration::seconds(61), 30, 60));
    }

    #[test]
    fn in_flight_order_is_reused_without_redispatch() {
        let order = Order {
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
            status: OrderStatus::Ack,
            last_error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(plan_redispatch(order, Utc::now()), RedispatchPlan::ReuseInFlight));
    }
}
