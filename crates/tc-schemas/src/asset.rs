use serde::{Deserialize, Serialize};
use tc_primitives::Decimal8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetCategory {
    Forex,
    Crypto,
    Indices,
    Commodities,
}

/// A tradable instrument. Immutable from the core's point of view for the
/// duration of a trading session — it is loaded once per bot evaluation and
/// never mutated in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub category: AssetCategory,
    pub min_qty: Decimal8,
    pub recommended_qty: Decimal8,
    pub max_spread: Decimal8,
    pub min_notional: Decimal8,
    pub is_active: bool,
}

impl Asset {
    pub fn effective_min_qty(&self) -> Decimal8 {
        self.min_qty.max(Decimal8::ZERO)
    }
}
