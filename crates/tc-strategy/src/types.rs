use serde::{Deserialize, Serialize};
use serde_json::Value;
use tc_primitives::{Candle, Decimal8};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyAction {
    Open,
    Skip,
}

/// What a single strategy evaluation produced for one symbol/timeframe.
/// `reason` is a stable machine-readable tag, not prose — callers aggregate
/// it for observability, so it must never vary with runtime values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub action: StrategyAction,
    pub direction: Option<Direction>,
    pub sl: Option<Decimal8>,
    pub tp: Option<Decimal8>,
    pub reason: String,
    pub strategy: String,
    pub score: f64,
    pub metadata: Value,
}

impl StrategyOutcome {
    pub fn skip(strategy: &str, reason: &str) -> Self {
        Self {
            action: StrategyAction::Skip,
            direction: None,
            sl: None,
            tp: None,
            reason: reason.to_string(),
            strategy: strategy.to_string(),
            score: 0.0,
            metadata: Value::Null,
        }
    }

    pub fn open(
        strategy: &str,
        direction: Direction,
        sl: Decimal8,
        tp: Decimal8,
        reason: &str,
        score: f64,
    ) -> Self {
        Self {
            action: StrategyAction::Open,
            direction: Some(direction),
            sl: Some(sl),
            tp: Some(tp),
            reason: reason.to_string(),
            strategy: strategy.to_string(),
            score: score.clamp(0.0, 1.0),
            metadata: Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_open(&self) -> bool {
        self.action == StrategyAction::Open
    }
}

/// Everything a strategy needs to evaluate one symbol/timeframe pair.
/// Deterministic inputs only — no IO, no wall-clock, no broker/DB handles.
#[derive(Clone, Debug)]
pub struct EngineContext<'a> {
    pub symbol: String,
    pub timeframe: String,
    pub entry_candles: &'a [Candle],
    pub htf_candles: Option<&'a [Candle]>,
    pub allowed_strategies: Option<&'a [String]>,
}

/// A strategy is a pure function of candles (plus optional higher-timeframe
/// context) to an outcome. Implementors must not hold mutable state across
/// calls — the catalog treats every strategy as a fresh evaluation each bar.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome;
}
