//! Trading session calendar.
//!
//! Deterministic, pure logic over a supplied `now` — no wall-clock reads
//! inside this module, so callers can replay historical timestamps.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc, Weekday};

use tc_schemas::AssetCategory;

/// Which category of market-hours rule applies to an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalendarSpec {
    /// 24/7 — crypto.
    AlwaysOn,
    /// Forex/CFD/Indices/Commodities: Mon-Fri open, closed Saturday, closed
    /// Sunday before 22:00 UTC, closed Friday after 22:00 UTC.
    WeekdaySession,
}

impl CalendarSpec {
    pub fn for_category(category: AssetCategory) -> Self {
        match category {
            AssetCategory::Crypto => CalendarSpec::AlwaysOn,
            AssetCategory::Forex | AssetCategory::Indices | AssetCategory::Commodities => {
                CalendarSpec::WeekdaySession
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarketStatus {
    Open,
    Closed { reason: &'static str, next_open: DateTime<Utc> },
}

impl MarketStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, MarketStatus::Open)
    }
}

fn next_sunday_22utc(from: DateTime<Utc>) -> DateTime<Utc> {
    let days_until_sunday = (7 - from.weekday().num_days_from_monday() + 6) % 7;
    let mut candidate = from.date_naive() + Duration::days(days_until_sunday as i64);
    let mut dt = Utc.from_utc_datetime(&candidate.and_hms_opt(22, 0, 0).unwrap());
    if dt <= from {
        candidate += Duration::days(7);
        dt = Utc.from_utc_datetime(&candidate.and_hms_opt(22, 0, 0).unwrap());
    }
    dt
}

/// Evaluate the calendar-only market status (no broker probe).
pub fn market_status(spec: CalendarSpec, now: DateTime<Utc>) -> MarketStatus {
    match spec {
        CalendarSpec::AlwaysOn => MarketStatus::Open,
        CalendarSpec::WeekdaySession => {
            let weekday = now.weekday();
            match weekday {
                Weekday::Sat => MarketStatus::Closed {
                    reason: "weekend",
                    next_open: next_sunday_22utc(now),
                },
                Weekday::Sun => {
                    if now.hour() < 22 {
                        MarketStatus::Closed {
                            reason: "pre_open",
                            next_open: now.date_naive().and_hms_opt(22, 0, 0).map(|d| Utc.from_utc_datetime(&d)).unwrap(),
                        }
                    } else {
                        MarketStatus::Open
                    }
                }
                Weekday::Fri => {
                    if now.hour() >= 22 {
                        MarketStatus::Closed {
                            reason: "friday_close",
                            next_open: next_sunday_22utc(now),
                        }
                    } else {
                        MarketStatus::Open
                    }
                }
                _ => MarketStatus::Open,
            }
        }
    }
}

/// A broker's view of a symbol's tradability, used to refine the calendar
/// verdict. Probe failure must never block trading — callers fall back to
/// `market_status` on any probe error.
#[derive(Clone, Debug)]
pub struct BrokerProbe {
    pub trade_allowed: bool,
    pub visible: bool,
    pub last_tick_at: DateTime<Utc>,
}

const STALE_TICK_SECS: i64 = 1800;

/// Refine a calendar verdict with a broker probe. Only narrows an `Open`
/// verdict to `Closed` — never reopens a calendar-closed market.
pub fn refine_with_probe(status: MarketStatus, probe: &BrokerProbe, now: DateTime<Utc>) -> MarketStatus {
    if !status.is_open() {
        return status;
    }
    if !probe.trade_allowed || !probe.visible {
        return MarketStatus::Closed {
            reason: "broker_trade_mode",
            next_open: now,
        };
    }
    if (now - probe.last_tick_at).num_seconds() > STALE_TICK_SECS {
        return MarketStatus::Closed {
            reason: "stale_tick",
            next_open: now,
        };
    }
    MarketStatus::Open
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn always_on_is_always_open() {
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 3, 0, 0).unwrap();
        assert_eq!(market_status(CalendarSpec::AlwaysOn, now), MarketStatus::Open);
    }

    #[test]
    fn saturday_is_closed() {
        // 2026-08-01 is a Saturday.
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        assert!(!market_status(CalendarSpec::WeekdaySession, now).is_open());
    }

    #[test]
    fn sunday_before_22_utc_is_closed() {
        let now = Utc.with_ymd_and_hms(2026, 8, 2, 10, 0, 0).unwrap();
        assert!(!market_status(CalendarSpec::WeekdaySession, now).is_open());
    }

    #[test]
    fn sunday_after_22_utc_is_open() {
        let now = Utc.with_ymd_and_hms(2026, 8, 2, 23, 0, 0).unwrap();
        assert!(market_status(CalendarSpec::WeekdaySession, now).is_open());
    }

    #[test]
    fn friday_after_22_utc_is_closed() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 23, 0, 0).unwrap();
        assert!(!market_status(CalendarSpec::WeekdaySession, now).is_open());
    }

    #[test]
    fn probe_failure_closes_an_otherwise_open_market() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap();
        let status = market_status(CalendarSpec::WeekdaySession, now);
        let probe = BrokerProbe {
            trade_allowed: true,
            visible: true,
            last_tick_at: now - Duration::seconds(STALE_TICK_SECS + 1),
        };
        let refined = refine_with_probe(status, &probe, now);
        assert!(!refined.is_open());
    }
}
