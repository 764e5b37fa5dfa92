//! Application-wide constants and tunable defaults.

/// Default worldstate API host queried by the remote fetcher.
pub const DEFAULT_API_HOST: &str = "api.warframestat.us";

/// Default platform code segment of the worldstate endpoint path.
pub const DEFAULT_PLATFORM_CODE: &str = "pc";

/// Fixed User-Agent header sent with every worldstate request.
pub const USER_AGENT: &str = concat!("sunwheel/", env!("CARGO_PKG_VERSION"));

/// Connect timeout for worldstate requests in milliseconds.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;

/// Elapsed time after the last successful fetch at which anchor data is
/// considered expired (3 hours).
pub const DEFAULT_EXPIRY_TIMEOUT_MS: i64 = 3 * 60 * 60 * 1000;

/// Span the reconstructed cycle schedule must cover around a date (24 hours).
pub const SCHEDULE_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Sentinel key/value used by the permissive worldstate scanner for items it
/// cannot split into a key/value pair.
pub const UNKNOWN_ENTRY: &str = "unknown";

// Observer coordinate limits
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

// Solar geometry
/// Altitude of the solar disc center at sunrise/sunset, degrees.
/// Accounts for atmospheric refraction and the disc radius.
pub const SUNRISE_SUNSET_ALTITUDE_DEG: f64 = -0.83;

/// Obliquity of the ecliptic, degrees.
pub const ECLIPTIC_OBLIQUITY_DEG: f64 = 23.4393;
