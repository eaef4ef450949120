//! Per-`(login, server)` circuit breaker: after `trip_threshold` consecutive
//! failures, calls are refused immediately for `cooldown` before the next
//! attempt is allowed through as a probe.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug, PartialEq)]
struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<DateTime<Utc>>,
}

impl BreakerState {
    fn fresh() -> Self {
        Self { consecutive_failures: 0, opened_at: None }
    }
}

pub struct CircuitBreaker {
    trip_threshold: u32,
    cooldown: Duration,
    states: BTreeMap<(String, String), BreakerState>,
}

impl CircuitBreaker {
    pub fn new(trip_threshold: u32, cooldown_seconds: i64) -> Self {
        Self {
            trip_threshold,
            cooldown: Duration::seconds(cooldown_seconds),
            states: BTreeMap::new(),
        }
    }

    fn key(login: &str, server: &str) -> (String, String) {
        (login.to_string(), server.to_string())
    }

    /// Whether the breaker currently refuses calls for this account.
    pub fn is_open(&self, login: &str, server: &str, now: DateTime<Utc>) -> bool {
        match self.states.get(&Self::key(login, server)) {
            Some(state) => match state.opened_at {
                Some(opened) => now - opened < self.cooldown,
                None => false,
            },
            None => false,
        }
    }

    pub fn record_failure(&mut self, login: &str, server: &str, now: DateTime<Utc>) {
        let state = self.states.entry(Self::key(login, server)).or_insert_with(BreakerState::fresh);
        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.trip_threshold && state.opened_at.is_none() {
            state.opened_at = Some(now);
        }
    }

    pub fn record_success(&mut self, login: &str, server: &str) {
        self.states.insert(Self::key(login, server), BreakerState::fresh());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let mut cb = CircuitBreaker::new(3, 60);
        let now = Utc::now();
        assert!(!cb.is_open("acct", "srv", now));
        cb.record_failure("acct", "srv", now);
        cb.record_failure("acct", "srv", now);
        assert!(!cb.is_open("acct", "srv", now));
        cb.record_failure("acct", "srv", now);
        assert!(cb.is_open("acct", "srv", now));
    }

    #[test]
    fn closes_after_cooldown_elapses() {
        let mut cb = CircuitBreaker::new(1, 10);
        let now = Utc::now();
        cb.record_failure("acct", "srv", now);
        assert!(cb.is_open("acct", "srv", now));
        assert!(!cb.is_open("acct", "srv", now + Duration::seconds(11)));
    }

    #[test]
    fn success_resets_the_counter() {
        let mut cb = CircuitBreaker::new(2, 60);
        let now = Utc::now();
        cb.record_failure("acct", "srv", now);
        cb.record_success("acct", "srv");
        cb.record_failure("acct", "srv", now);
        assert!(!cb.is_open("acct", "srv", now));
    }
}
