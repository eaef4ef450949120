//! Broker reconcile for live positions the database doesn't know about:
//! a live MT5 position with no matching open DB position gets a synthetic
//! close dispatched, unless a recent order on that symbol already covers
//! it (grace period, so a just-created order isn't immediately reconciled
//! against).

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug, PartialEq)]
pub struct LiveBrokerPosition {
    pub symbol: String,
    pub qty_nonzero: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecentOrderOnSymbol {
    pub symbol: String,
    pub updated_at: DateTime<Utc>,
}

pub const RECONCILE_GRACE: Duration = Duration::minutes(5);

/// Symbols carrying a live broker position with no DB counterpart, and no
/// order updated within the grace window — these need a reconcile-close.
pub fn symbols_needing_reconcile_close<'a>(
    live_positions: &'a [LiveBrokerPosition],
    known_symbols: &[String],
    recent_orders: &[RecentOrderOnSymbol],
    now: DateTime<Utc>,
) -> Vec<&'a str> {
    live_positions
        .iter()
        .filter(|p| p.qty_nonzero)
        .filter(|p| !known_symbols.iter().any(|s| s == &p.symbol))
        .filter(|p| !recent_orders.iter().any(|r| r.symbol == p.symbol && now - r.updated_at < RECONCILE_GRACE))
        .map(|p| p.symbol.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_live_position_needs_a_reconcile_close() {
        let live = vec![LiveBrokerPosition { symbol: "EURUSD".into(), qty_nonzero: true }];
        let result = symbols_needing_reconcile_close(&live, &[], &[], Utc::now());
        assert_eq!(result, vec!["EURUSD"]);
    }

    #[test]
    fn known_position_is_skipped() {
        let live = vec![LiveBrokerPosition { symbol: "EURUSD".into(), qty_nonzero: true }];
        let known = vec!["EURUSD".to_string()];
        assert!(symbols_needing_reconcile_close(&live, &known, &[], Utc::now()).is_empty());
    }

    #[test]
    fn recent_order_within_grace_suppresses_reconcile() {
        let now = Utc::now();
        let live = vec![LiveBrokerPosition { symbol: "EURUSD".into(), qty_nonzero: true }];
        let recent = vec![RecentOrderOnSymbol { symbol: "EURUSD".into(), updated_at: now - Duration::minutes(1) }];
        assert!(symbols_needing_reconcile_close(&live, &[], &recent, now).is_empty());
    }

    #[test]
    fn order_outside_grace_no_longer_suppresses() {
        let now = Utc::now();
        let live = vec![LiveBrokerPosition { symbol: "EURUSD".into(), qty_nonzero: true }];
        let recent = vec![RecentOrderOnSymbol { symbol: "EURUSD".into(), updated_at: now - Duration::minutes(10) }];
        assert_eq!(symbols_needing_reconcile_close(&live, &[], &recent, now), vec!["EURUSD"]);
    }
}
