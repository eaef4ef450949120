use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    Buy,
    Sell,
}

impl SignalDirection {
    pub fn opposite(self) -> Self {
        match self {
            SignalDirection::Buy => SignalDirection::Sell,
            SignalDirection::Sell => SignalDirection::Buy,
        }
    }
}

/// A raw trade signal, either produced internally by a strategy or ingested
/// from an external alert webhook. Immutable after creation; `dedupe_key`
/// enforces at-most-once ingestion for a given (source, symbol, payload)
/// tuple at the persistence layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: uuid::Uuid,
    pub source: String,
    pub symbol: String,
    pub timeframe: String,
    pub direction: SignalDirection,
    pub payload: serde_json::Value,
    pub dedupe_key: String,
    pub bot_id: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
}
