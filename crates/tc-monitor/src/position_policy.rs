//! Per-tick position policy: early exit, ATR trailing stop, and the
//! kill-switch rule, evaluated as one pure function over a snapshot of a
//! position and the current market. Pure and deterministic — callers
//! supply `mid_price`, ATR, and the engine's opposite-signal confirmation;
//! this module reads no clock and touches no broker.

use tc_primitives::Decimal8;
use tc_schemas::Position;

#[derive(Clone, Debug, PartialEq)]
pub enum TickAction {
    /// No rule fired this tick.
    Hold,
    /// Early-exit or kill-switch fired — close the position now.
    Close { reason: &'static str },
    /// Trailing stop advanced; apply the new SL.
    UpdateStop { new_sl: Decimal8 },
}

fn unrealized(position: &Position, mid_price: Decimal8) -> Decimal8 {
    mid_price.saturating_sub(position.avg_price).checked_mul(position.qty).unwrap_or(Decimal8::ZERO)
}

fn notional(position: &Position, mid_price: Decimal8) -> Decimal8 {
    position.qty.abs().checked_mul(mid_price).unwrap_or(Decimal8::MAX)
}

fn loss_pct(position: &Position, mid_price: Decimal8) -> Decimal8 {
    let u = unrealized(position, mid_price);
    if !u.is_negative() {
        return Decimal8::ZERO;
    }
    let n = notional(position, mid_price);
    if n.is_zero() {
        return Decimal8::ZERO;
    }
    (-u) / n
}

/// `favorable_price_move ≥ 0` means the position has moved in its own
/// direction by that many price units since entry.
fn favorable_price_move(position: &Position, mid_price: Decimal8) -> Decimal8 {
    if position.is_long() {
        mid_price.saturating_sub(position.avg_price)
    } else {
        position.avg_price.saturating_sub(mid_price)
    }
}

pub struct TickInputs {
    pub mid_price: Decimal8,
    pub atr: Option<Decimal8>,
    pub early_exit_max_unrealized_pct: Decimal8,
    pub trailing_trigger: Decimal8,
    pub trailing_distance: Decimal8,
    pub kill_switch_max_unrealized_pct: Decimal8,
    pub engine_confirms_opposite: bool,
}

/// Evaluate early exit, kill-switch, then trailing stop, in that priority
/// order — a close always wins over a stop adjustment.
pub fn evaluate_tick(position: &Position, inputs: &TickInputs) -> TickAction {
    if position.is_flat() {
        return TickAction::Hold;
    }

    let lp = loss_pct(position, inputs.mid_price);

    if inputs.early_exit_max_unrealized_pct.is_positive() && lp >= inputs.early_exit_max_unrealized_pct {
        return TickAction::Close { reason: "early_exit_max_unrealized_pct" };
    }

    let unrealized_loss_positive = lp.is_positive();
    if unrealized_loss_positive {
        let kill_threshold = inputs.kill_switch_max_unrealized_pct.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::MAX);
        if inputs.engine_confirms_opposite || (kill_threshold.is_positive() && lp >= kill_threshold) {
            return TickAction::Close { reason: "kill_switch" };
        }
    }

    let move_in_favor = favorable_price_move(position, inputs.mid_price);
    if inputs.trailing_trigger.is_positive() && move_in_favor >= inputs.trailing_trigger {
        let distance = inputs.atr.map(|a| a.checked_mul(Decimal8::from_f64(0.5)).unwrap_or(Decimal8::ZERO)).unwrap_or(inputs.trailing_distance);
        let candidate_sl = if position.is_long() {
            inputs.mid_price.saturating_sub(distance)
        } else {
            inputs.mid_price.saturating_add(distance)
        };
        let new_sl = match position.sl {
            Some(cur) if position.is_long() => cur.max(candidate_sl),
            Some(cur) => cur.min(candidate_sl),
            None => candidate_sl,
        };
        if position.sl != Some(new_sl) {
            return TickAction::UpdateStop { new_sl };
        }
    }

    TickAction::Hold
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::PositionStatus;
    use uuid::Uuid;

    fn long_position(avg: f64, sl: Option<f64>) -> Position {
        Position {
            id: Uuid::new_v4(),
            broker_account_id: Uuid::new_v4(),
            symbol: "EURUSD".into(),
            qty: Decimal8::from_f64(1.0),
            avg_price: Decimal8::from_f64(avg),
            sl: sl.map(Decimal8::from_f64),
            tp: None,
            status: PositionStatus::Open,
        }
    }

    fn inputs(mid: f64) -> TickInputs {
        TickInputs {
            mid_price: Decimal8::from_f64(mid),
            atr: None,
            early_exit_max_unrealized_pct: Decimal8::from_f64(0.05),
            trailing_trigger: Decimal8::from_f64(0.01),
            trailing_distance: Decimal8::from_f64(0.005),
            kill_switch_max_unrealized_pct: Decimal8::from_f64(0.02),
            engine_confirms_opposite: false,
        }
    }

    #[test]
    fn deep_loss_triggers_early_exit() {
        let pos = long_position(1.10, None);
        let action = evaluate_tick(&pos, &inputs(1.00));
        assert_eq!(action, TickAction::Close { reason: "early_exit_max_unrealized_pct" });
    }

    #[test]
    fn engine_opposite_confirmation_triggers_kill_switch_on_any_loss() {
        let pos = long_position(1.10, None);
        let mut i = inputs(1.099);
        i.early_exit_max_unrealized_pct = Decimal8::from_f64(0.5);
        i.engine_confirms_opposite = true;
        assert_eq!(evaluate_tick(&pos, &i), TickAction::Close { reason: "kill_switch" });
    }

    #[test]
    fn profit_past_trigger_advances_the_trailing_stop() {
        let pos = long_position(1.10, None);
        let action = evaluate_tick(&pos, &inputs(1.115));
        match action {
            TickAction::UpdateStop { new_sl } => assert_eq!(new_sl, Decimal8::from_f64(1.110)),
            other => panic!("expected UpdateStop, got {other:?}"),
        }
    }

    #[test]
    fn flat_position_is_always_held() {
        let mut pos = long_position(1.10, None);
        pos.close();
        assert_eq!(evaluate_tick(&pos, &inputs(1.00)), TickAction::Hold);
    }
}
