//! Size multiplier and loss-streak psychology.
//!
//! Deterministic, pure logic: no IO, no time reads other than the `now`
//! passed in by the caller.

use chrono::{DateTime, Duration, Utc};
use tc_primitives::Decimal8;
use tc_schemas::{BotStatus, PsychologyState};

use crate::types::{GlobalRiskSettings, PsychologyUpdate, TradeOutcome};

/// Effective per-bot thresholds after taking the most conservative of the
/// global settings and the bot's own configuration. A zero value on either
/// side means "not configured" and defers entirely to the other side.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveThresholds {
    pub max_loss_streak_before_pause: i32,
    pub loss_streak_cooldown_min: i64,
    pub soft_drawdown_limit_pct: Decimal8,
    pub hard_drawdown_limit_pct: Decimal8,
    pub soft_size_multiplier: Decimal8,
    pub hard_size_multiplier: Decimal8,
}

fn min_positive(a: i32, b: i32) -> i32 {
    match (a > 0, b > 0) {
        (true, true) => a.min(b),
        (true, false) => a,
        (false, true) => b,
        (false, false) => 0,
    }
}

fn min_positive_decimal(a: Decimal8, b: Decimal8) -> Decimal8 {
    match (a.is_positive(), b.is_positive()) {
        (true, true) => a.min(b),
        (true, false) => a,
        (false, true) => b,
        (false, false) => Decimal8::ZERO,
    }
}

pub fn effective_thresholds(bot: &PsychologyState, global: &GlobalRiskSettings) -> EffectiveThresholds {
    EffectiveThresholds {
        max_loss_streak_before_pause: min_positive(bot.max_loss_streak_before_pause, global.max_loss_streak_before_pause),
        loss_streak_cooldown_min: bot.loss_streak_cooldown_min.max(global.loss_streak_cooldown_min),
        soft_drawdown_limit_pct: min_positive_decimal(bot.soft_drawdown_limit_pct, global.soft_drawdown_limit_pct),
        hard_drawdown_limit_pct: min_positive_decimal(bot.hard_drawdown_limit_pct, global.hard_drawdown_limit_pct),
        // A multiplier of 1 means "no reduction" — the conservative choice
        // between two configured multipliers is the smaller one.
        soft_size_multiplier: min_positive_decimal(bot.soft_size_multiplier, global.soft_size_multiplier),
        hard_size_multiplier: min_positive_decimal(bot.hard_size_multiplier, global.hard_size_multiplier),
    }
}

/// The position-size multiplier a bot should trade at right now, given
/// today's realized PnL so far. `1.0` unless today is net negative and a
/// drawdown threshold is configured and breached.
pub fn get_size_multiplier(
    psychology: &PsychologyState,
    global: &GlobalRiskSettings,
    realized_today: Decimal8,
    paper_start_balance: Decimal8,
) -> Decimal8 {
    let one = Decimal8::from_int(1);
    if realized_today.is_zero() || realized_today.is_positive() {
        return one;
    }
    let eff = effective_thresholds(psychology, global);
    if eff.hard_drawdown_limit_pct.is_zero() && eff.soft_drawdown_limit_pct.is_zero() {
        return one;
    }
    if paper_start_balance.is_zero() {
        return one;
    }
    let dd_pct = match (-realized_today).checked_mul(Decimal8::from_int(100)) {
        Some(scaled) => scaled / paper_start_balance,
        None => Decimal8::MAX,
    };

    if eff.hard_drawdown_limit_pct.is_positive() && dd_pct >= eff.hard_drawdown_limit_pct {
        eff.hard_size_multiplier
    } else if eff.soft_drawdown_limit_pct.is_positive() && dd_pct >= eff.soft_drawdown_limit_pct {
        eff.soft_size_multiplier
    } else {
        one
    }
}

/// Advance the loss streak after a trade closes and decide whether the
/// streak now triggers a cooldown pause. Mutates `psychology` in place;
/// the caller is responsible for applying `should_pause` to `bot.status`.
pub fn update_bot_after_realized_pnl(
    psychology: &mut PsychologyState,
    global: &GlobalRiskSettings,
    pnl: Decimal8,
    now: DateTime<Utc>,
) -> PsychologyUpdate {
    match TradeOutcome::from_pnl(pnl) {
        TradeOutcome::Loss => psychology.current_loss_streak += 1,
        TradeOutcome::Win => psychology.current_loss_streak = 0,
        TradeOutcome::Breakeven => {}
    }

    let eff = effective_thresholds(psychology, global);
    let should_pause = eff.max_loss_streak_before_pause > 0
        && psychology.current_loss_streak >= eff.max_loss_streak_before_pause
        && eff.loss_streak_cooldown_min > 0;

    let paused_until = if should_pause {
        let until = now + Duration::minutes(eff.loss_streak_cooldown_min);
        psychology.paused_until = Some(until);
        Some(until)
    } else {
        None
    };

    PsychologyUpdate {
        new_loss_streak: psychology.current_loss_streak,
        should_pause,
        paused_until,
    }
}

/// Apply a pause decision to a bot's status field. Kept separate from
/// `update_bot_after_realized_pnl` so callers that only track streak state
/// (e.g. backtests) don't have to carry a mutable `BotStatus` around.
pub fn apply_pause(status: &mut BotStatus, update: &PsychologyUpdate) {
    if update.should_pause {
        *status = BotStatus::Paused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_schemas::PsychologyState;

    fn psych() -> PsychologyState {
        PsychologyState {
            current_loss_streak: 0,
            paused_until: None,
            max_loss_streak_before_pause: 3,
            loss_streak_cooldown_min: 60,
            soft_drawdown_limit_pct: Decimal8::from_int(5),
            hard_drawdown_limit_pct: Decimal8::from_int(10),
            soft_size_multiplier: Decimal8::from_f64(0.5),
            hard_size_multiplier: Decimal8::from_f64(0.25),
        }
    }

    #[test]
    fn positive_pnl_is_full_size() {
        let p = psych();
        let mult = get_size_multiplier(&p, &GlobalRiskSettings::unset(), Decimal8::from_int(100), Decimal8::from_int(10_000));
        assert_eq!(mult, Decimal8::from_int(1));
    }

    #[test]
    fn hard_drawdown_breach_uses_hard_multiplier() {
        let p = psych();
        let mult = get_size_multiplier(&p, &GlobalRiskSettings::unset(), Decimal8::from_int(-1200), Decimal8::from_int(10_000));
        assert_eq!(mult, Decimal8::from_f64(0.25));
    }

    #[test]
    fn soft_drawdown_breach_uses_soft_multiplier() {
        let p = psych();
        let mult = get_size_multiplier(&p, &GlobalRiskSettings::unset(), Decimal8::from_int(-600), Decimal8::from_int(10_000));
        assert_eq!(mult, Decimal8::from_f64(0.5));
    }

    #[test]
    fn three_straight_losses_trigger_pause() {
        let mut p = psych();
        let global = GlobalRiskSettings::unset();
        let now = Utc::now();
        update_bot_after_realized_pnl(&mut p, &global, Decimal8::from_int(-10), now);
        update_bot_after_realized_pnl(&mut p, &global, Decimal8::from_int(-10), now);
        let update = update_bot_after_realized_pnl(&mut p, &global, Decimal8::from_int(-10), now);
        assert!(update.should_pause);
        assert_eq!(p.current_loss_streak, 3);
        assert!(p.paused_until.is_some());
    }

    #[test]
    fn a_win_resets_the_streak() {
        let mut p = psych();
        let global = GlobalRiskSettings::unset();
        let now = Utc::now();
        update_bot_after_realized_pnl(&mut p, &global, Decimal8::from_int(-10), now);
        update_bot_after_realized_pnl(&mut p, &global, Decimal8::from_int(-10), now);
        update_bot_after_realized_pnl(&mut p, &global, Decimal8::from_int(5), now);
        assert_eq!(p.current_loss_streak, 0);
    }
}
