//! Staleness monitoring for anchor data.
//!
//! Anchor data ages out once the last successful fetch is more than the
//! expiry timeout behind the clock. Staleness is a one-way latch: once
//! tripped it holds, even across failed refreshes or a clock that drifts
//! backwards, and only a successful fetch moving `last_fetch_time` forward
//! lets the next query recompute downward.

use chrono::{DateTime, Utc};

use super::CycleAnchor;
use crate::constants::DEFAULT_EXPIRY_TIMEOUT_MS;
use crate::time_source;

/// Derives whether an anchor store's data should be considered expired.
#[derive(Debug, Clone)]
pub struct StalenessMonitor {
    timeout_ms: i64,
    latched: bool,
    /// Anchor fetch time observed when the latch tripped. A differing value
    /// on a later query means a successful fetch happened since.
    fetch_time_at_latch: Option<DateTime<Utc>>,
}

impl StalenessMonitor {
    /// Monitor with the default 3 hour timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_EXPIRY_TIMEOUT_MS)
    }

    pub fn with_timeout(timeout_ms: i64) -> Self {
        Self {
            timeout_ms,
            latched: false,
            fetch_time_at_latch: None,
        }
    }

    /// Whether the anchor's data is expired. Never-fetched anchors are stale.
    pub fn is_stale(&mut self, anchor: &CycleAnchor) -> bool {
        if self.latched && anchor.last_fetch_time() == self.fetch_time_at_latch {
            // Latched, and no successful fetch since: stays stale.
            return true;
        }
        self.latched = false;

        let stale = match anchor.last_fetch_time() {
            None => true,
            Some(fetched) => (time_source::now() - fetched).num_milliseconds() > self.timeout_ms,
        };
        if stale {
            self.latched = true;
            self.fetch_time_at_latch = anchor.last_fetch_time();
        }
        stale
    }
}

impl Default for StalenessMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_source::set_fixed_now;
    use chrono::{Duration, TimeZone};
    use serial_test::serial;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn fetched_at(t: DateTime<Utc>) -> CycleAnchor {
        let mut anchor = CycleAnchor::new();
        anchor.record_success(true, t + Duration::minutes(30), t);
        anchor
    }

    #[test]
    #[serial]
    fn never_fetched_anchor_is_stale() {
        set_fixed_now(utc(2024, 5, 1, 12, 0, 0));
        let mut monitor = StalenessMonitor::new();
        assert!(monitor.is_stale(&CycleAnchor::new()));
    }

    #[test]
    #[serial]
    fn fresh_fetch_is_not_stale() {
        set_fixed_now(utc(2024, 5, 1, 12, 0, 0));
        let anchor = fetched_at(utc(2024, 5, 1, 11, 0, 0));
        let mut monitor = StalenessMonitor::new();
        assert!(!monitor.is_stale(&anchor));
    }

    #[test]
    #[serial]
    fn trips_after_timeout_and_is_idempotent() {
        let fetch_time = utc(2024, 5, 1, 8, 0, 0);
        let anchor = fetched_at(fetch_time);
        let mut monitor = StalenessMonitor::new();

        set_fixed_now(utc(2024, 5, 1, 10, 59, 0));
        assert!(!monitor.is_stale(&anchor));

        set_fixed_now(utc(2024, 5, 1, 11, 0, 1));
        assert!(monitor.is_stale(&anchor));
        // Repeated queries without an intervening fetch return the same value
        assert!(monitor.is_stale(&anchor));
        assert!(monitor.is_stale(&anchor));
    }

    #[test]
    #[serial]
    fn latch_holds_even_if_the_clock_moves_back() {
        let anchor = fetched_at(utc(2024, 5, 1, 8, 0, 0));
        let mut monitor = StalenessMonitor::new();

        set_fixed_now(utc(2024, 5, 1, 11, 30, 0));
        assert!(monitor.is_stale(&anchor));

        set_fixed_now(utc(2024, 5, 1, 9, 0, 0));
        assert!(monitor.is_stale(&anchor), "latch must not re-evaluate downward");
    }

    #[test]
    #[serial]
    fn failed_fetch_does_not_clear_the_latch() {
        let mut anchor = fetched_at(utc(2024, 5, 1, 8, 0, 0));
        let mut monitor = StalenessMonitor::new();

        set_fixed_now(utc(2024, 5, 1, 11, 30, 0));
        assert!(monitor.is_stale(&anchor));

        anchor.record_failure("connection timed out".into());
        assert!(monitor.is_stale(&anchor));
    }

    #[test]
    #[serial]
    fn successful_fetch_clears_the_latch() {
        let mut anchor = fetched_at(utc(2024, 5, 1, 8, 0, 0));
        let mut monitor = StalenessMonitor::new();

        set_fixed_now(utc(2024, 5, 1, 11, 30, 0));
        assert!(monitor.is_stale(&anchor));

        anchor.record_success(false, utc(2024, 5, 1, 12, 0, 0), utc(2024, 5, 1, 11, 30, 0));
        assert!(!monitor.is_stale(&anchor));
    }
}
