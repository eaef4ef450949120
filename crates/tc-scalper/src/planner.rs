//! The scalper planner: translates a raw signal plus the merged
//! `ScalperConfig` into an open/ignore decision with SL/TP, a sized risk
//! percentage, and a quality score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

use crate::config::ScalperConfig;
use crate::Direction;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScalperAction {
    Open,
    Ignore,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub trend: f64,
    pub structure: f64,
    pub market: f64,
    pub session: f64,
}

impl ScoreComponents {
    pub fn total(&self) -> f64 {
        (self.trend + self.structure + self.market + self.session).min(1.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalperDecision {
    pub action: ScalperAction,
    pub reason: String,
    pub direction: Option<Direction>,
    pub entry: Option<Decimal8>,
    pub sl: Option<Decimal8>,
    pub tp: Option<Decimal8>,
    pub risk_pct: Option<f64>,
    pub score: f64,
    pub score_components: ScoreComponents,
}

impl ScalperDecision {
    fn ignore(reason: &str) -> Self {
        Self {
            action: ScalperAction::Ignore,
            reason: reason.to_string(),
            direction: None,
            entry: None,
            sl: None,
            tp: None,
            risk_pct: None,
            score: 0.0,
            score_components: ScoreComponents::default(),
        }
    }
}

/// Everything the planner needs to size and gate one signal. Deliberately
/// flat — every field is either already computed by the caller (candles
/// -> bias, broker -> spread/ATR) or carried straight from the signal.
pub struct PlannerInput<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub direction: Direction,
    pub now: DateTime<Utc>,
    pub entry_price: Option<Decimal8>,
    pub live_mid_price: Decimal8,
    pub htf_bias: Option<Direction>,
    pub atr_points: Option<f64>,
    pub spread_points: Option<f64>,
    pub broker_stop_level_points: Option<f64>,
    pub drawdown_pct: f64,
    pub conservative_mode: bool,
}

fn points_to_price(points: f64, point_size: Decimal8) -> Decimal8 {
    point_size.checked_mul(Decimal8::from_f64(points)).unwrap_or(Decimal8::ZERO)
}

/// Plan one scalper signal against the merged configuration. Every `ignore`
/// path returns a stable `scalper:<reason>` tag the decision pipeline and
/// observability layer can aggregate on.
pub fn plan(cfg: &ScalperConfig, input: &PlannerInput<'_>) -> ScalperDecision {
    let symbol_cfg = match cfg.symbol_config(input.symbol) {
        Some(s) => s,
        None => return ScalperDecision::ignore("scalper:symbol_disabled"),
    };

    if !symbol_cfg.execution_timeframes.iter().any(|tf| tf == input.timeframe) {
        return ScalperDecision::ignore("scalper:timeframe_not_allowed");
    }

    if !symbol_cfg.sessions.is_empty() {
        let t = input.now.time();
        if !symbol_cfg.sessions.iter().any(|s| s.contains(t)) {
            return ScalperDecision::ignore("scalper:session_closed");
        }
    }

    if let Some(bias) = input.htf_bias {
        if bias != input.direction {
            return ScalperDecision::ignore("scalper:trend_only");
        }
    }

    let entry = input.entry_price.unwrap_or(input.live_mid_price);

    let sl_points = symbol_cfg.sl_points.unwrap_or_else(|| {
        input
            .atr_points
            .unwrap_or_else(|| (symbol_cfg.sl_points_min + symbol_cfg.sl_points_max) / 2.0)
    });
    let sl_points = sl_points.clamp(symbol_cfg.sl_points_min, symbol_cfg.sl_points_max);

    let mut sl_distance = points_to_price(sl_points, symbol_cfg.point_size);
    if let Some(stop_level_points) = input.broker_stop_level_points {
        let min_distance = points_to_price(stop_level_points, symbol_cfg.point_size);
        if sl_distance < min_distance {
            sl_distance = min_distance;
        }
    }

    if let Some(spread_points) = input.spread_points {
        let spread_price = points_to_price(spread_points, symbol_cfg.point_size);
        if sl_distance < spread_price.checked_mul(Decimal8::from_int(2)).unwrap_or(Decimal8::ZERO) {
            return ScalperDecision::ignore("scalper:sl_too_tight_for_spread");
        }
    }

    let (sl, tp) = match input.direction {
        Direction::Buy => {
            let sl = entry.saturating_sub(sl_distance);
            let tp = entry.saturating_add(sl_distance.checked_mul(Decimal8::from_f64(symbol_cfg.tp_r_multiple)).unwrap_or(Decimal8::ZERO));
            (sl, tp)
        }
        Direction::Sell => {
            let sl = entry.saturating_add(sl_distance);
            let tp = entry.saturating_sub(sl_distance.checked_mul(Decimal8::from_f64(symbol_cfg.tp_r_multiple)).unwrap_or(Decimal8::ZERO));
            (sl, tp)
        }
    };

    let is_countertrend = input.htf_bias.map(|b| b != input.direction).unwrap_or(false);
    let risk_pct = cfg.risk.effective_risk_pct(input.drawdown_pct, input.conservative_mode, is_countertrend);

    let trend_agreement = match input.htf_bias {
        Some(bias) if bias == input.direction => 1.0,
        Some(_) => 0.0,
        None => 0.5,
    };
    let sl_in_range = (sl_points - symbol_cfg.sl_points_min) / (symbol_cfg.sl_points_max - symbol_cfg.sl_points_min).max(1e-9);
    let structure_quality = (1.0 - (sl_in_range - 0.5).abs() * 2.0).clamp(0.0, 1.0);
    let spread_penalty = input.spread_points.map(|s| (s / 20.0).min(1.0)).unwrap_or(0.0);
    let atr_quality = input.atr_points.map(|a| (a / 30.0).min(1.0)).unwrap_or(0.5);
    let market_quality = ((atr_quality - spread_penalty) * 0.5 + 0.5).clamp(0.0, 1.0);
    let in_major_session = symbol_cfg.sessions.iter().any(|s| s.name.eq_ignore_ascii_case("london") || s.name.eq_ignore_ascii_case("new_york"));
    let session_quality = if in_major_session { 1.0 } else { 0.5 };

    let weights = &cfg.score_weights;
    let components = ScoreComponents {
        trend: weights.trend * trend_agreement,
        structure: weights.structure * structure_quality,
        market: weights.market * market_quality,
        session: weights.session * session_quality,
    };
    let score = components.total();

    ScalperDecision {
        action: ScalperAction::Open,
        reason: "scalper:plan".to_string(),
        direction: Some(input.direction),
        entry: Some(entry),
        sl: Some(sl),
        tp: Some(tp),
        risk_pct: Some(risk_pct),
        score,
        score_components: components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CountertrendConfig, ReentryRules, RiskEnvelope, ScoreWeights, SymbolConfig};

    fn test_cfg() -> ScalperConfig {
        ScalperConfig {
            symbols: vec![SymbolConfig {
                symbol: "EURUSD".into(),
                aliases: vec![],
                execution_timeframes: vec!["M5".into()],
                point_size: Decimal8::from_f64(0.0001),
                sl_points: None,
                sl_points_min: 10.0,
                sl_points_max: 30.0,
                tp_r_multiple: 1.5,
                sessions: vec![],
            }],
            risk: RiskEnvelope {
                default_risk_pct: 1.0,
                conservative_risk_pct: 0.5,
                soft_dd_pct: 5.0,
                soft_multiplier: 0.7,
                hard_dd_pct: 10.0,
                hard_multiplier: 0.3,
                hard_cap_pct: 2.0,
                countertrend: CountertrendConfig { allowed: true, risk_multiplier: 0.5 },
            },
            reentry: ReentryRules { max_reentries_per_session: 2, cooldown_minutes: 15 },
            score_weights: ScoreWeights::default(),
        }
    }

    #[test]
    fn unknown_symbol_is_ignored() {
        let cfg = test_cfg();
        let input = PlannerInput {
            symbol: "GBPUSD",
            timeframe: "M5",
            direction: Direction::Buy,
            now: Utc::now(),
            entry_price: Some(Decimal8::from_f64(1.1)),
            live_mid_price: Decimal8::from_f64(1.1),
            htf_bias: None,
            atr_points: None,
            spread_points: None,
            broker_stop_level_points: None,
            drawdown_pct: 0.0,
            conservative_mode: false,
        };
        let decision = plan(&cfg, &input);
        assert_eq!(decision.reason, "scalper:symbol_disabled");
    }

    #[test]
    fn opposite_bias_is_trend_only_rejected() {
        let cfg = test_cfg();
        let input = PlannerInput {
            symbol: "EURUSD",
            timeframe: "M5",
            direction: Direction::Buy,
            now: Utc::now(),
            entry_price: Some(Decimal8::from_f64(1.1)),
            live_mid_price: Decimal8::from_f64(1.1),
            htf_bias: Some(Direction::Sell),
            atr_points: None,
            spread_points: None,
            broker_stop_level_points: None,
            drawdown_pct: 0.0,
            conservative_mode: false,
        };
        let decision = plan(&cfg, &input);
        assert_eq!(decision.reason, "scalper:trend_only");
    }

    #[test]
    fn valid_signal_opens_with_positive_risk_reward() {
        let cfg = test_cfg();
        let input = PlannerInput {
            symbol: "EURUSD",
            timeframe: "M5",
            direction: Direction::Buy,
            now: Utc::now(),
            entry_price: Some(Decimal8::from_f64(1.1000)),
            live_mid_price: Decimal8::from_f64(1.1000),
            htf_bias: Some(Direction::Buy),
            atr_points: Some(15.0),
            spread_points: Some(1.0),
            broker_stop_level_points: None,
            drawdown_pct: 0.0,
            conservative_mode: false,
        };
        let decision = plan(&cfg, &input);
        assert_eq!(decision.action, ScalperAction::Open);
        let sl = decision.sl.unwrap();
        let tp = decision.tp.unwrap();
        assert!(sl < Decimal8::from_f64(1.1000));
        assert!(tp > Decimal8::from_f64(1.1000));
        assert!(decision.score > 0.0);
    }
}
