//! Snapshot monotonicity watermark: a broker snapshot older than the last
//! accepted one is rejected outright rather than compared, so a stale
//! fetch can't mask real drift behind an outdated "clean" result.

use crate::types::BrokerSnapshot;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotFreshness {
    Fresh,
    Stale { watermark_ms: i64, got_ms: i64 },
    NoTimestamp,
}

impl SnapshotFreshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, SnapshotFreshness::Fresh)
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_fresh()
    }
}

#[derive(Clone, Debug)]
pub struct SnapshotWatermark {
    last_accepted_ms: i64,
}

impl Default for SnapshotWatermark {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotWatermark {
    pub fn new() -> Self {
        Self { last_accepted_ms: i64::MIN }
    }

    pub fn check(&self, snap: &BrokerSnapshot) -> SnapshotFreshness {
        if snap.fetched_at_ms == 0 {
            return SnapshotFreshness::NoTimestamp;
        }
        if snap.fetched_at_ms < self.last_accepted_ms {
            return SnapshotFreshness::Stale { watermark_ms: self.last_accepted_ms, got_ms: snap.fetched_at_ms };
        }
        SnapshotFreshness::Fresh
    }

    pub fn accept(&mut self, snap: &BrokerSnapshot) -> SnapshotFreshness {
        let result = self.check(snap);
        if result.is_fresh() {
            self.last_accepted_ms = snap.fetched_at_ms;
        }
        result
    }

    pub fn last_accepted_ms(&self) -> i64 {
        self.last_accepted_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_positive_timestamp_is_accepted() {
        let mut wm = SnapshotWatermark::new();
        let snap = BrokerSnapshot::empty(1000);
        assert_eq!(wm.accept(&snap), SnapshotFreshness::Fresh);
        assert_eq!(wm.last_accepted_ms(), 1000);
    }

    #[test]
    fn older_snapshot_is_rejected_as_stale() {
        let mut wm = SnapshotWatermark::new();
        wm.accept(&BrokerSnapshot::empty(1000));
        let result = wm.accept(&BrokerSnapshot::empty(500));
        assert_eq!(result, SnapshotFreshness::Stale { watermark_ms: 1000, got_ms: 500 });
        assert_eq!(wm.last_accepted_ms(), 1000);
    }

    #[test]
    fn zero_timestamp_is_always_rejected() {
        let wm = SnapshotWatermark::new();
        assert_eq!(wm.check(&BrokerSnapshot::empty(0)), SnapshotFreshness::NoTimestamp);
    }
}
