//! The scalper's own layered configuration: per-symbol execution rules,
//! session windows, and the risk envelope the planner sizes trades from.
//! Deep-merging these layers into a `RuntimeConfig` is `tc-config`'s job;
//! this module only defines the shape.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            t >= self.start && t <= self.end
        } else {
            t >= self.start || t <= self.end
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CountertrendConfig {
    pub allowed: bool,
    pub risk_multiplier: f64,
}

/// Risk sizing behavior driven by account drawdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskEnvelope {
    pub default_risk_pct: f64,
    pub conservative_risk_pct: f64,
    pub soft_dd_pct: f64,
    pub soft_multiplier: f64,
    pub hard_dd_pct: f64,
    pub hard_multiplier: f64,
    pub hard_cap_pct: f64,
    pub countertrend: CountertrendConfig,
}

impl RiskEnvelope {
    /// Effective risk percentage after drawdown scaling and the
    /// countertrend multiplier, clamped to `hard_cap_pct`.
    pub fn effective_risk_pct(&self, drawdown_pct: f64, conservative_mode: bool, is_countertrend: bool) -> f64 {
        let base = if conservative_mode { self.conservative_risk_pct } else { self.default_risk_pct };
        let mut risk = if drawdown_pct >= self.hard_dd_pct {
            base * self.hard_multiplier
        } else if drawdown_pct >= self.soft_dd_pct {
            base * self.soft_multiplier
        } else {
            base
        };
        if is_countertrend {
            risk *= self.countertrend.risk_multiplier;
        }
        risk.min(self.hard_cap_pct)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReentryRules {
    pub max_reentries_per_session: i32,
    pub cooldown_minutes: i64,
}

/// Per-symbol execution parameters. `aliases` lets a signal arrive under a
/// broker-specific symbol name (e.g. `EURUSD.m`) and still resolve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolConfig {
    pub symbol: String,
    pub aliases: Vec<String>,
    pub execution_timeframes: Vec<String>,
    pub point_size: Decimal8,
    pub sl_points: Option<f64>,
    pub sl_points_min: f64,
    pub sl_points_max: f64,
    pub tp_r_multiple: f64,
    pub sessions: Vec<SessionWindow>,
}

impl SymbolConfig {
    pub fn matches(&self, symbol: &str) -> bool {
        self.symbol.eq_ignore_ascii_case(symbol) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(symbol))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub trend: f64,
    pub structure: f64,
    pub market: f64,
    pub session: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { trend: 0.4, structure: 0.3, market: 0.2, session: 0.1 }
    }
}

/// The merged scalper configuration a bot's planner runs against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalperConfig {
    pub symbols: Vec<SymbolConfig>,
    pub risk: RiskEnvelope,
    pub reentry: ReentryRules,
    pub score_weights: ScoreWeights,
}

impl ScalperConfig {
    pub fn symbol_config(&self, symbol: &str) -> Option<&SymbolConfig> {
        self.symbols.iter().find(|s| s.matches(symbol))
    }
}
