//! Time source abstraction for supporting both real and fixed time.
//!
//! The engine reads "now" exclusively through this module so tests and the
//! staleness/staleness-adjacent logic can run against a frozen clock instead
//! of waiting for wall time to pass. The default source is the system clock;
//! a fixed source can be installed once per process.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time reads.
pub trait TimeSource: Send + Sync {
    /// Get the current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Real-time implementation that uses the system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time source for tests and offline simulation.
///
/// The reported instant never advances on its own; callers move it
/// explicitly with [`FixedTimeSource::set`].
pub struct FixedTimeSource {
    current: std::sync::Mutex<DateTime<Utc>>,
}

impl FixedTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: std::sync::Mutex::new(start),
        }
    }

    /// Move the reported instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.current.lock().unwrap() = instant;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap()
    }
}

/// Initialize the global time source (call once at startup).
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Get the current instant from the global time source.
pub fn now() -> DateTime<Utc> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Install (on first call) and position a process-wide fixed time source.
///
/// Must be called before anything else reads `now()`, otherwise the real
/// clock has already been installed and the call has no effect on the
/// source selection. Tests touching this are serialized for that reason.
#[cfg(any(test, feature = "testing-support"))]
pub fn set_fixed_now(instant: DateTime<Utc>) {
    static FIXED: OnceCell<Arc<FixedTimeSource>> = OnceCell::new();

    let fixed = FIXED.get_or_init(|| {
        let source = Arc::new(FixedTimeSource::new(instant));
        init_time_source(source.clone());
        source
    });
    fixed.set(instant);
}

/// Parse a calendar date in the format "YYYY-MM-DD".
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date format: {e}. Use YYYY-MM-DD"))
}
