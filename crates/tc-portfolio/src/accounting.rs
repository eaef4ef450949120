//! Fill -> position accounting. A weighted-average cost model, not a
//! FIFO lot book: `Position.avg_price` is a single running average, so a
//! same-sign fill blends into it and an opposite-sign fill realizes PnL
//! against it before any remainder reopens at the new price.

use chrono::{DateTime, Utc};
use tc_primitives::Decimal8;
use tc_schemas::{Execution, Order, OrderSide, Position, TradeLog, TradeLogStatus};
use uuid::Uuid;

/// What applying a fill produced, beyond the mutated `Position` itself.
#[derive(Clone, Debug, PartialEq)]
pub struct FillOutcome {
    pub execution: Execution,
    pub realized_pnl: Option<Decimal8>,
}

fn signed_delta(side: OrderSide, qty: Decimal8) -> Decimal8 {
    match side {
        OrderSide::Buy => qty,
        OrderSide::Sell => -qty,
    }
}

/// Blend a new fill into the running weighted-average price, or reprice to
/// the fill price when the position flips sign or was flat.
fn next_avg_price(pos_qty_before: Decimal8, avg_before: Decimal8, delta: Decimal8, price: Decimal8) -> Decimal8 {
    if pos_qty_before.is_zero() {
        return price;
    }
    let same_sign = pos_qty_before.is_positive() == delta.is_positive();
    if !same_sign {
        return price;
    }
    let total_qty = pos_qty_before.abs().saturating_add(delta.abs());
    if total_qty.is_zero() {
        return Decimal8::ZERO;
    }
    let weighted = avg_before
        .checked_mul(pos_qty_before.abs())
        .unwrap_or(Decimal8::MAX)
        .saturating_add(price.checked_mul(delta.abs()).unwrap_or(Decimal8::MAX));
    weighted / total_qty
}

/// Realized PnL when a fill reduces (or crosses through) an existing
/// position: `(price - avg_before) * closing_qty * direction`, where
/// `direction` is +1 for a prior long, -1 for a prior short.
fn realized_pnl(pos_qty_before: Decimal8, avg_before: Decimal8, delta: Decimal8, price: Decimal8) -> Option<Decimal8> {
    if pos_qty_before.is_zero() {
        return None;
    }
    let same_sign = pos_qty_before.is_positive() == delta.is_positive();
    if same_sign {
        return None;
    }
    let closing_qty = pos_qty_before.abs().min(delta.abs());
    let direction = if pos_qty_before.is_positive() { 1 } else { -1 };
    let diff = price.saturating_sub(avg_before);
    let magnitude = diff.checked_mul(closing_qty).unwrap_or(Decimal8::MAX);
    Some(if direction > 0 { magnitude } else { -magnitude })
}

/// Apply one fill `(order, qty, price)` to `position`, mutating it in place
/// per the weighted-average/realize rules, and return the `Execution` row
/// plus any realized PnL from this fill.
pub fn apply_fill(position: &mut Position, order: &Order, qty: Decimal8, price: Decimal8, fee: Decimal8, now: DateTime<Utc>) -> FillOutcome {
    let delta = signed_delta(order.side, qty);
    let pos_qty_before = position.qty;
    let avg_before = position.avg_price;

    let new_avg = next_avg_price(pos_qty_before, avg_before, delta, price);
    let pnl = realized_pnl(pos_qty_before, avg_before, delta, price);
    let new_qty = pos_qty_before.saturating_add(delta);

    position.qty = new_qty;
    if new_qty.is_zero() {
        position.close();
    } else {
        position.avg_price = new_avg;
        position.status = tc_schemas::PositionStatus::Open;
    }

    let execution = Execution {
        id: Uuid::new_v4(),
        order_id: order.id,
        qty,
        price,
        fee,
        exec_time: now,
        account_balance_after: None,
    };

    FillOutcome { execution, realized_pnl: pnl }
}

/// The result of replaying a full fill history from flat: where the
/// position should end up if the book is internally consistent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplaySummary {
    pub qty: Decimal8,
    pub avg_price: Decimal8,
    pub realized_pnl: Decimal8,
}

/// Replay a position's complete fill history from flat, using the same
/// weighted-average/realize rules as [`apply_fill`]. Backs both
/// `recompute_pnl_from_positions` (wants `realized_pnl`) and
/// `reconcile_trades` (wants `qty`, to catch drift between the stored
/// position row and what its own executions imply).
pub fn replay_fills(fills: &[(OrderSide, Decimal8, Decimal8)]) -> ReplaySummary {
    let mut qty = Decimal8::ZERO;
    let mut avg = Decimal8::ZERO;
    let mut realized = Decimal8::ZERO;

    for &(side, fill_qty, price) in fills {
        let delta = signed_delta(side, fill_qty);
        if let Some(pnl) = realized_pnl(qty, avg, delta, price) {
            realized = realized.saturating_add(pnl);
        }
        avg = next_avg_price(qty, avg, delta, price);
        qty = qty.saturating_add(delta);
    }

    ReplaySummary { qty, avg_price: avg, realized_pnl: realized }
}

pub fn trade_log_status_for_pnl(pnl: Decimal8) -> TradeLogStatus {
    if pnl.is_positive() {
        TradeLogStatus::Win
    } else if pnl.is_negative() {
        TradeLogStatus::Loss
    } else {
        TradeLogStatus::Breakeven
    }
}

pub fn realized_trade_log(order: &Order, pnl: Decimal8, now: DateTime<Utc>) -> TradeLog {
    TradeLog {
        id: Uuid::new_v4(),
        order_id: order.id,
        bot_id: order.bot_id,
        status: trade_log_status_for_pnl(pnl),
        pnl: Some(pnl),
        recorded_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::{OrderStatus, PositionStatus};

    fn order(side: OrderSide) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            bot_id: Uuid::new_v4(),
            broker_account_id: Uuid::new_v4(),
            client_order_id: "x".into(),
            broker_order_id: None,
            symbol: "EURUSD".into(),
            side,
            qty: Decimal8::from_f64(0.1),
            price: None,
            sl: None,
            tp: None,
            status: OrderStatus::Filled,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn flat_position() -> Position {
        Position::flat(Uuid::new_v4(), "EURUSD")
    }

    #[test]
    fn opening_from_flat_sets_avg_to_fill_price() {
        let mut pos = flat_position();
        let outcome = apply_fill(&mut pos, &order(OrderSide::Buy), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        assert_eq!(pos.avg_price, Decimal8::from_f64(1.1000));
        assert_eq!(pos.status, PositionStatus::Open);
        assert!(outcome.realized_pnl.is_none());
    }

    #[test]
    fn adding_same_direction_blends_weighted_average() {
        let mut pos = flat_position();
        apply_fill(&mut pos, &order(OrderSide::Buy), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        apply_fill(&mut pos, &order(OrderSide::Buy), Decimal8::from_f64(0.1), Decimal8::from_f64(1.2000), Decimal8::ZERO, Utc::now());
        assert_eq!(pos.qty, Decimal8::from_f64(0.2));
        assert_eq!(pos.avg_price, Decimal8::from_f64(1.1500));
    }

    #[test]
    fn reducing_a_long_realizes_pnl_and_keeps_avg_price() {
        let mut pos = flat_position();
        apply_fill(&mut pos, &order(OrderSide::Buy), Decimal8::from_f64(0.2), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        let outcome = apply_fill(&mut pos, &order(OrderSide::Sell), Decimal8::from_f64(0.1), Decimal8::from_f64(1.2000), Decimal8::ZERO, Utc::now());
        assert_eq!(pos.qty, Decimal8::from_f64(0.1));
        assert_eq!(pos.avg_price, Decimal8::from_f64(1.1000));
        assert_eq!(outcome.realized_pnl, Some(Decimal8::from_f64(0.01)));
    }

    #[test]
    fn fully_closing_resets_the_closed_invariant() {
        let mut pos = flat_position();
        apply_fill(&mut pos, &order(OrderSide::Buy), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        let outcome = apply_fill(&mut pos, &order(OrderSide::Sell), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1500), Decimal8::ZERO, Utc::now());
        assert!(pos.is_flat());
        assert_eq!(pos.status, PositionStatus::Closed);
        assert!(pos.sl.is_none() && pos.tp.is_none());
        assert_eq!(outcome.realized_pnl, Some(Decimal8::from_f64(0.005)));
    }

    #[test]
    fn crossing_through_flat_reopens_at_the_new_fill_price() {
        let mut pos = flat_position();
        apply_fill(&mut pos, &order(OrderSide::Buy), Decimal8::from_f64(0.1), Decimal8::from_f64(1.1000), Decimal8::ZERO, Utc::now());
        apply_fill(&mut pos, &order(OrderSide::Sell), Decimal8::from_f64(0.3), Decimal8::from_f64(1.2000), Decimal8::ZERO, Utc::now());
        assert_eq!(pos.qty, Decimal8::from_f64(-0.2));
        assert_eq!(pos.avg_price, Decimal8::from_f64(1.2000));
    }

    #[test]
    fn replay_matches_fill_by_fill_accumulation_for_a_closed_position() {
        let fills = vec![
            (OrderSide::Buy, Decimal8::from_f64(0.2), Decimal8::from_f64(1.1000)),
            (OrderSide::Sell, Decimal8::from_f64(0.1), Decimal8::from_f64(1.2000)),
            (OrderSide::Sell, Decimal8::from_f64(0.1), Decimal8::from_f64(1.1500)),
        ];
        let summary = replay_fills(&fills);
        assert_eq!(summary.qty, Decimal8::ZERO);
        assert_eq!(summary.realized_pnl, Decimal8::from_f64(0.01) + Decimal8::from_f64(0.005));
    }

    #[test]
    fn replay_of_a_still_open_position_reports_running_qty_and_no_realized_pnl() {
        let fills = vec![
            (OrderSide::Buy, Decimal8::from_f64(0.2), Decimal8::from_f64(1.1000)),
            (OrderSide::Buy, Decimal8::from_f64(0.1), Decimal8::from_f64(1.2000)),
        ];
        let summary = replay_fills(&fills);
        assert_eq!(summary.qty, Decimal8::from_f64(0.3));
        assert_eq!(summary.realized_pnl, Decimal8::ZERO);
    }
}
