//! Remote cycle tracking for two-phase periodic game events.
//!
//! Each tracked location alternates between exactly two phases (day/night on
//! the plains, warm/cold in the valley). The worldstate endpoint only ever
//! reports the current phase and the instant it expires. Everything else is
//! reconstructed locally from that single anchor: the full boundary schedule
//! around any date, the current phase at an arbitrary instant, and the
//! staleness of the data.
//!
//! Submodules follow the data flow: `fetcher` writes the [`anchor`] store,
//! `schedule` and `staleness` read it.

pub mod anchor;
pub mod fetcher;
pub mod schedule;
pub mod staleness;

pub use anchor::CycleAnchor;
pub use fetcher::{FetchOutcome, Fetcher, HttpTransport, ReqwestTransport};
pub use schedule::{CycleBoundary, cycles_near, phase_at};
pub use staleness::StalenessMonitor;

/// One of the two recurring phases of a tracked cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// The longer-named "main" phase the remote keyword reports on (day, warm).
    Main,
    /// The opposite phase (night, cold).
    Last,
}

/// Static definition of one tracked location.
///
/// Pure configuration data: phase durations never mutate at runtime, and the
/// full period is always `main_phase_ms + last_phase_ms`.
#[derive(Debug, Clone, Copy)]
pub struct CycleLocation {
    pub name: &'static str,
    /// Display names for the two phases, main first.
    pub main_phase_name: &'static str,
    pub last_phase_name: &'static str,
    pub main_phase_ms: i64,
    pub last_phase_ms: i64,
    /// Key in the worldstate response whose "true"/"false" value reports
    /// whether the main phase is active.
    pub main_keyword: &'static str,
    /// Key in the worldstate response holding the phase expiry timestamp.
    pub expiry_keyword: &'static str,
    /// Final path segment of the worldstate endpoint.
    pub endpoint_path: &'static str,
    /// Shift applied to UTC midnight when reconstructing a date's schedule.
    /// Lets a location's day-boundary convention differ from UTC midnight.
    pub midnight_shift_ms: i64,
}

impl CycleLocation {
    /// Total duration of one full phase pair.
    pub const fn period_ms(&self) -> i64 {
        self.main_phase_ms + self.last_phase_ms
    }

    /// Display name of a phase.
    pub const fn phase_name(&self, phase: CyclePhase) -> &'static str {
        match phase {
            CyclePhase::Main => self.main_phase_name,
            CyclePhase::Last => self.last_phase_name,
        }
    }
}

/// Plains cycle: 100 minutes of day, 50 minutes of night.
pub const CETUS: CycleLocation = CycleLocation {
    name: "Cetus",
    main_phase_name: "day",
    last_phase_name: "night",
    main_phase_ms: 100 * 60 * 1000,
    last_phase_ms: 50 * 60 * 1000,
    main_keyword: "isDay",
    expiry_keyword: "expiry",
    endpoint_path: "cetusCycle",
    midnight_shift_ms: 0,
};

/// Valley cycle: 6:40 warm, 20:00 cold. The 12 hour midnight shift keeps the
/// reconstructed window useful for callers in negative-offset timezones.
pub const VALLIS: CycleLocation = CycleLocation {
    name: "Orb Vallis",
    main_phase_name: "warm",
    last_phase_name: "cold",
    main_phase_ms: 400 * 1000,
    last_phase_ms: 1200 * 1000,
    main_keyword: "isWarm",
    expiry_keyword: "expiry",
    endpoint_path: "vallisCycle",
    midnight_shift_ms: 12 * 60 * 60 * 1000,
};

/// All tracked locations, in display order.
pub const LOCATIONS: [&CycleLocation; 2] = [&CETUS, &VALLIS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_is_sum_of_phase_durations() {
        assert_eq!(CETUS.period_ms(), 9_000_000);
        assert_eq!(VALLIS.period_ms(), 1_600_000);
    }

    #[test]
    fn phase_names_follow_location_vocabulary() {
        assert_eq!(CETUS.phase_name(CyclePhase::Main), "day");
        assert_eq!(CETUS.phase_name(CyclePhase::Last), "night");
        assert_eq!(VALLIS.phase_name(CyclePhase::Main), "warm");
        assert_eq!(VALLIS.phase_name(CyclePhase::Last), "cold");
    }
}
