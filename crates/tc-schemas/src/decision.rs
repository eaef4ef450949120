use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Open,
    Close,
    Ignore,
}

/// Decision-specific overrides. `position_id` is only meaningful for
/// `DecisionAction::Close`; `scalp` marks a decision produced by the
/// scalper planner rather than the catalog/arbitrator path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionParams {
    pub sl: Option<Decimal8>,
    pub tp: Option<Decimal8>,
    pub qty: Option<Decimal8>,
    pub position_id: Option<uuid::Uuid>,
    pub scalp: bool,
}

/// What the decision pipeline concluded a given signal should do, for a
/// given bot. One signal produces at most one decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: uuid::Uuid,
    pub signal_id: uuid::Uuid,
    pub bot_id: uuid::Uuid,
    pub action: DecisionAction,
    pub reason: String,
    pub score: f64,
    pub params: DecisionParams,
}

impl Decision {
    pub fn ignore<S: Into<String>>(signal_id: uuid::Uuid, bot_id: uuid::Uuid, reason: S) -> Self {
        Self {
            id: uuid::Uuid::nil(),
            signal_id,
            bot_id,
            action: DecisionAction::Ignore,
            reason: reason.into(),
            score: 0.0,
            params: DecisionParams::default(),
        }
    }
}
