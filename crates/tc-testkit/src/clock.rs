//! A controllable clock for scenarios that need deterministic time
//! progression (psychology pause windows, flip cooldowns, stale-order
//! timeouts) without sleeping or reading the wall clock.

use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

pub struct FakeClock {
    now: Cell<DateTime<Utc>>,
}

impl FakeClock {
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    pub fn advance(&self, delta: Duration) -> DateTime<Utc> {
        let next = self.now.get() + delta;
        self.now.set(next);
        next
    }

    pub fn advance_minutes(&self, minutes: i64) -> DateTime<Utc> {
        self.advance(Duration::minutes(minutes))
    }

    pub fn advance_seconds(&self, seconds: i64) -> DateTime<Utc> {
        self.advance(Duration::seconds(seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn advancing_moves_now_forward_deterministically() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FakeClock::at(start);
        assert_eq!(clock.now(), start);
        let after = clock.advance_minutes(30);
        assert_eq!(after, start + Duration::minutes(30));
        assert_eq!(clock.now(), after);
    }
}
