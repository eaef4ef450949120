//! Flip handling: when an opposite-direction signal scores high enough to
//! reverse an existing position outright instead of just scalping on top
//! of it, pair the open with a synthetic close of the prior position.

use tc_schemas::{Decision, DecisionAction};
use uuid::Uuid;

use crate::types::DecisionContext;

pub enum FlipVerdict {
    Allowed(Decision),
    Blocked(&'static str),
}

/// Build the paired close decision for a flip, enforcing the flip-specific
/// cooldown and daily cap. `position_id` is the position being reversed.
pub fn resolve_flip(ctx: &DecisionContext, signal_id: Uuid, bot_id: Uuid, position_id: Uuid) -> FlipVerdict {
    if ctx
        .minutes_since_last_flip_close
        .map(|m| m < ctx.runtime.decision_flip_cooldown_min)
        .unwrap_or(false)
    {
        return FlipVerdict::Blocked("flip_cooldown_active");
    }
    if ctx.flips_today >= ctx.runtime.decision_max_flips_per_day {
        return FlipVerdict::Blocked("flip_daily_limit_reached");
    }

    let mut close = Decision::ignore(signal_id, bot_id, "flip_close");
    close.id = Uuid::new_v4();
    close.action = DecisionAction::Close;
    close.params.position_id = Some(position_id);
    FlipVerdict::Allowed(close)
}
