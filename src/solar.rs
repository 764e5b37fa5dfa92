//! Solar ephemeris calculations for an observer position.
//!
//! Computes sunrise, sunset and solar-noon instants for a calendar date from
//! the closed-form approximations of the sunrise equation: mean anomaly,
//! equation of center, ecliptic longitude, declination, solar transit, hour
//! angle. Everything is a pure function of (date, longitude, latitude); no
//! state survives between calls.
//!
//! At extreme latitudes the hour-angle arc-cosine has no real solution and
//! the calculation reports [`NoSunriseSunset`] (polar day or polar night)
//! instead of letting a NaN escape into the instants.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::constants::{
    ECLIPTIC_OBLIQUITY_DEG, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE,
    SUNRISE_SUNSET_ALTITUDE_DEG,
};

/// Observer coordinates in degrees, validated on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverPosition {
    latitude: f64,
    longitude: f64,
}

impl ObserverPosition {
    /// Create a position, rejecting out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&latitude) {
            return Err(anyhow!(
                "Latitude {latitude} out of range ({MIN_LATITUDE} to {MAX_LATITUDE})"
            ));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&longitude) {
            return Err(anyhow!(
                "Longitude {longitude} out of range ({MIN_LONGITUDE} to {MAX_LONGITUDE})"
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Sun times and angles for one date at one position.
///
/// All fields are derived; the calculation is cheap enough to rerun on every
/// query, so results are never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemerisResult {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub solar_noon: DateTime<Utc>,
    /// Half-arc of the sun above the horizon, degrees.
    pub hour_angle_degrees: f64,
    pub declination_degrees: f64,
}

impl EphemerisResult {
    /// Time the sun spends above the horizon.
    pub fn day_length(&self) -> Duration {
        self.sunset - self.sunrise
    }
}

/// Which polar condition suppressed sunrise/sunset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarPeriod {
    /// Sun stays above the horizon all day.
    PolarDay,
    /// Sun stays below the horizon all day.
    PolarNight,
}

/// The hour-angle arc-cosine had no real solution for this date/latitude.
///
/// A defined outcome, not an engine failure: the caller picks the fallback
/// (full-day or full-night) from `polar`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoSunriseSunset {
    pub polar: PolarPeriod,
    pub declination_degrees: f64,
}

impl std::fmt::Display for NoSunriseSunset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.polar {
            PolarPeriod::PolarDay => write!(f, "no sunrise/sunset: polar day"),
            PolarPeriod::PolarNight => write!(f, "no sunrise/sunset: polar night"),
        }
    }
}

impl std::error::Error for NoSunriseSunset {}

const MS_PER_DAY: f64 = 86_400_000.0;

fn sin_deg(deg: f64) -> f64 {
    deg.to_radians().sin()
}

fn cos_deg(deg: f64) -> f64 {
    deg.to_radians().cos()
}

/// Whole days between the date and the J2000 epoch date (2000-01-01).
fn days_since_j2000(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

/// The J2000 reference instant (Julian day 2451545.0 = 2000-01-01 12:00 UTC).
fn j2000_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Convert a fractional day offset from the J2000 instant to a UTC instant.
fn instant_from_j2000_offset(offset_days: f64) -> DateTime<Utc> {
    j2000_instant() + Duration::milliseconds((offset_days * MS_PER_DAY).round() as i64)
}

/// Compute the ephemeris for the UTC calendar date of a zoned instant.
pub fn compute_for_instant<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    position: ObserverPosition,
) -> Result<EphemerisResult, NoSunriseSunset> {
    compute_ephemeris(instant.with_timezone(&Utc).date_naive(), position)
}

/// Compute sunrise, sunset and solar noon for one date at one position.
///
/// Fails only when the hour-angle arc-cosine has no real solution (polar day
/// or polar night); every other input produces finite instants.
pub fn compute_ephemeris(
    date: NaiveDate,
    position: ObserverPosition,
) -> Result<EphemerisResult, NoSunriseSunset> {
    let j = days_since_j2000(date);

    // Mean anomaly and equation of center, degrees
    let mean_anomaly = (-3.59 + 0.98560 * j).rem_euclid(360.0);
    let center = 1.9148 * sin_deg(mean_anomaly)
        + 0.0200 * sin_deg(2.0 * mean_anomaly)
        + 0.0003 * sin_deg(3.0 * mean_anomaly);

    // Ecliptic longitude of the sun, degrees
    let ecliptic_longitude = (mean_anomaly + 102.9373 + center + 180.0).rem_euclid(360.0);

    let declination =
        (sin_deg(ecliptic_longitude) * sin_deg(ECLIPTIC_OBLIQUITY_DEG)).asin().to_degrees();

    // Solar transit as a fractional day offset from the J2000 instant
    let n = j + 0.0009;
    let j_star = n - position.longitude / 360.0;
    let transit = j_star + 0.0053 * sin_deg(mean_anomaly) - 0.0068 * sin_deg(2.0 * ecliptic_longitude);

    // Hour angle of sunrise/sunset; acos domain error means the sun never
    // crosses the -0.83 degree altitude on this date
    let cos_hour_angle = (sin_deg(SUNRISE_SUNSET_ALTITUDE_DEG)
        - sin_deg(position.latitude) * sin_deg(declination))
        / (cos_deg(position.latitude) * cos_deg(declination));

    if cos_hour_angle > 1.0 {
        return Err(NoSunriseSunset {
            polar: PolarPeriod::PolarNight,
            declination_degrees: declination,
        });
    }
    if cos_hour_angle < -1.0 {
        return Err(NoSunriseSunset {
            polar: PolarPeriod::PolarDay,
            declination_degrees: declination,
        });
    }

    let hour_angle = cos_hour_angle.acos().to_degrees();

    Ok(EphemerisResult {
        sunrise: instant_from_j2000_offset(transit - hour_angle / 360.0),
        sunset: instant_from_j2000_offset(transit + hour_angle / 360.0),
        solar_noon: instant_from_j2000_offset(transit),
        hour_angle_degrees: hour_angle,
        declination_degrees: declination,
    })
}
