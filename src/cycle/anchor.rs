//! The cycle anchor store: last known remote state for one location.
//!
//! A plain mutable record with a single writer (the fetcher) and any number
//! of readers (schedule reconstruction, staleness monitoring, the CLI).
//! Callers must not refresh the same store concurrently without external
//! synchronization; the fetcher assumes it can read then write fields
//! without interleaving.

use chrono::{DateTime, Utc};

use super::CyclePhase;

/// Most recently fetched remote state, plus fetch bookkeeping.
///
/// Starts out never-fetched; a failed refresh only touches the error fields,
/// so the last good phase/expiry pair keeps being served until a successful
/// refresh overwrites it.
#[derive(Debug, Clone, Default)]
pub struct CycleAnchor {
    current_phase_is_main: bool,
    phase_expiry: Option<DateTime<Utc>>,
    last_fetch_time: Option<DateTime<Utc>>,
    fetch_succeeded: bool,
    fetch_count: u32,
    last_error: Option<String>,
}

impl CycleAnchor {
    /// Fresh store in the never-fetched state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the phase active as of the last successful fetch is the main
    /// phase. Meaningless until [`has_anchor`](Self::has_anchor) is true.
    pub fn current_phase_is_main(&self) -> bool {
        self.current_phase_is_main
    }

    /// Phase active as of the last successful fetch, if any fetch succeeded.
    pub fn current_phase(&self) -> Option<CyclePhase> {
        self.phase_expiry.map(|_| {
            if self.current_phase_is_main {
                CyclePhase::Main
            } else {
                CyclePhase::Last
            }
        })
    }

    /// Instant at which the currently known phase ends.
    pub fn phase_expiry(&self) -> Option<DateTime<Utc>> {
        self.phase_expiry
    }

    /// Instant of the last successful fetch.
    pub fn last_fetch_time(&self) -> Option<DateTime<Utc>> {
        self.last_fetch_time
    }

    /// Whether the most recent refresh attempt succeeded.
    pub fn fetch_succeeded(&self) -> bool {
        self.fetch_succeeded
    }

    /// Number of successful fetches so far. Failures do not count.
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count
    }

    /// Error message of the most recent failed refresh, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True once any fetch has succeeded and an anchor exists to
    /// extrapolate from.
    pub fn has_anchor(&self) -> bool {
        self.phase_expiry.is_some()
    }

    /// Record a successful fetch, overwriting the anchor wholesale.
    pub(crate) fn record_success(
        &mut self,
        phase_is_main: bool,
        phase_expiry: DateTime<Utc>,
        fetch_time: DateTime<Utc>,
    ) {
        self.current_phase_is_main = phase_is_main;
        self.phase_expiry = Some(phase_expiry);
        self.last_fetch_time = Some(fetch_time);
        self.fetch_succeeded = true;
        self.fetch_count += 1;
        self.last_error = None;
    }

    /// Record a failed fetch attempt. The previous phase/expiry pair and the
    /// success bookkeeping stay untouched.
    pub(crate) fn record_failure(&mut self, message: String) {
        self.fetch_succeeded = false;
        self.last_error = Some(message);
    }

    /// Build a store in the post-successful-fetch state without a fetcher.
    #[cfg(any(test, feature = "testing-support"))]
    pub fn seeded(
        phase_is_main: bool,
        phase_expiry: DateTime<Utc>,
        fetch_time: DateTime<Utc>,
    ) -> Self {
        let mut anchor = Self::new();
        anchor.record_success(phase_is_main, phase_expiry, fetch_time);
        anchor
    }
}
