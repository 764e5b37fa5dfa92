//! Cycle schedule reconstruction from a single anchor.
//!
//! The remote endpoint only ever hands out one (phase, expiry) pair. Because
//! the period is fixed per location, that single instant pins the entire
//! boundary lattice: every past and future phase flip sits a whole number of
//! periods away from it. This module rebuilds the ordered main-phase windows
//! covering a full day around any requested date.
//!
//! The offset normalization below, including the extra period subtraction on
//! positive offsets, is a contract verified by the property tests. The two
//! corrections interact, and getting either backwards shifts every boundary
//! by exactly one period.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use super::{CycleAnchor, CycleLocation, CyclePhase};
use crate::constants::SCHEDULE_WINDOW_MS;

/// One reconstructed main-phase window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBoundary {
    pub main_start: DateTime<Utc>,
    pub main_end: DateTime<Utc>,
}

/// UTC midnight of the date, shifted by the location's day-boundary offset.
fn shifted_midnight(location: &CycleLocation, date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() + Duration::milliseconds(location.midnight_shift_ms)
}

/// Start of the main phase of the cycle nearest the shifted midnight.
///
/// Returns None while no successful fetch has provided an anchor.
fn aligned_cycle_start(
    anchor: &CycleAnchor,
    location: &CycleLocation,
    date: NaiveDate,
) -> Option<DateTime<Utc>> {
    let expiry = anchor.phase_expiry()?;
    let period = location.period_ms();
    let midnight = shifted_midnight(location, date);

    let offset_ms = (expiry - midnight).num_milliseconds();
    let mut cycle_start = midnight + Duration::milliseconds(offset_ms.rem_euclid(period));
    if offset_ms > 0 {
        // The expiry instant itself belongs to the previous period relative
        // to midnight when the raw offset was positive.
        cycle_start -= Duration::milliseconds(period);
    }

    // The aligned boundary starts whichever phase the anchor's current phase
    // flips into. When that is the non-main phase, step back over the main
    // window that precedes it.
    if anchor.current_phase_is_main() {
        cycle_start -= Duration::milliseconds(location.main_phase_ms);
    }

    Some(cycle_start)
}

/// Ordered main-phase windows covering at least 24 hours around the
/// requested date's (shifted) midnight.
///
/// Empty when no successful fetch has ever occurred; that is a defined
/// result, not an error.
pub fn cycles_near(
    anchor: &CycleAnchor,
    location: &CycleLocation,
    date: NaiveDate,
) -> Vec<CycleBoundary> {
    let Some(cycle_start) = aligned_cycle_start(anchor, location, date) else {
        return Vec::new();
    };

    let period = location.period_ms();
    let window_count = (SCHEDULE_WINDOW_MS + period - 1) / period + 1;

    (0..=window_count)
        .map(|i| {
            let main_start = cycle_start + Duration::milliseconds(i * period);
            CycleBoundary {
                main_start,
                main_end: main_start + Duration::milliseconds(location.main_phase_ms),
            }
        })
        .collect()
}

/// Phase active at an arbitrary instant, with the instant it ends.
///
/// Extrapolates from the anchor in either direction, so it keeps answering
/// (on stale data) long after the fetched expiry has passed.
pub fn phase_at(
    anchor: &CycleAnchor,
    location: &CycleLocation,
    instant: DateTime<Utc>,
) -> Option<(CyclePhase, DateTime<Utc>)> {
    let expiry = anchor.phase_expiry()?;
    let period = location.period_ms();

    // Normalize to a known main-phase start.
    let main_start = if anchor.current_phase_is_main() {
        expiry - Duration::milliseconds(location.main_phase_ms)
    } else {
        expiry
    };

    let into_cycle = (instant - main_start).num_milliseconds().rem_euclid(period);
    let cycle_begin = instant - Duration::milliseconds(into_cycle);

    if into_cycle < location.main_phase_ms {
        Some((
            CyclePhase::Main,
            cycle_begin + Duration::milliseconds(location.main_phase_ms),
        ))
    } else {
        Some((CyclePhase::Last, cycle_begin + Duration::milliseconds(period)))
    }
}
