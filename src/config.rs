//! TOML configuration with validation.
//!
//! Settings live in `sunwheel.toml` under the XDG config directory. A
//! missing file is not an error: a commented default file is written out and
//! the defaults are used. Every value is range-checked on load so the engine
//! never sees out-of-domain coordinates or zero timeouts.

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use crate::constants::{
    DEFAULT_API_HOST, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_EXPIRY_TIMEOUT_MS,
    DEFAULT_PLATFORM_CODE,
};
use crate::solar::ObserverPosition;

/// Contents of the default configuration file written on first run.
const DEFAULT_CONFIG_FILE: &str = "\
#[Observer]
latitude = 45.78          # Geographic latitude (-90 to +90)
longitude = 15.98         # Geographic longitude (-180 to +180)
#timezone = \"Europe/Zagreb\"  # IANA timezone for displayed times (default: UTC)

#[Worldstate]
#api_host = \"api.warframestat.us\"  # Worldstate API host
#platform = \"pc\"                   # Platform code in the endpoint path
#connect_timeout_ms = 20000        # HTTP connect timeout (1000-120000)
#expiry_timeout_ms = 10800000      # Anchor data expiry (60000 and up)
";

/// User configuration, all fields optional with built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Geographic latitude in degrees (-90 to +90)
    pub latitude: Option<f64>,
    /// Geographic longitude in degrees (-180 to +180)
    pub longitude: Option<f64>,
    /// IANA timezone name used when displaying computed instants
    pub timezone: Option<String>,
    /// Worldstate API host
    pub api_host: Option<String>,
    /// Platform code segment of the endpoint path
    pub platform: Option<String>,
    /// HTTP connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
    /// Elapsed time after which anchor data counts as expired, milliseconds
    pub expiry_timeout_ms: Option<i64>,
}

impl Config {
    /// Load from the default path, creating a commented default file first
    /// if none exists yet.
    pub fn load() -> Result<Self> {
        let path = default_config_path()?;
        if !path.exists() {
            create_default_config(&path)?;
            log_indented!("Created default config at {}", path.display());
        }
        Self::load_from_path(&path)
    }

    /// Load and validate a specific config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => {
                // Reuse the position constructor's range checks
                ObserverPosition::new(lat, lon).context("Invalid observer coordinates")?;
            }
            (None, None) => {}
            _ => {
                return Err(anyhow!(
                    "Both latitude and longitude must be set together (or neither)"
                ));
            }
        }

        if let Some(ref tz) = self.timezone {
            tz.parse::<Tz>()
                .map_err(|_| anyhow!("Unknown timezone: {tz}. Use an IANA name like Europe/Zagreb"))?;
        }

        if let Some(ms) = self.connect_timeout_ms
            && !(1_000..=120_000).contains(&ms)
        {
            return Err(anyhow!(
                "connect_timeout_ms {ms} out of range (1000 to 120000)"
            ));
        }

        if let Some(ms) = self.expiry_timeout_ms
            && ms < 60_000
        {
            return Err(anyhow!("expiry_timeout_ms {ms} too short (minimum 60000)"));
        }

        Ok(())
    }

    /// Observer position, if coordinates are configured.
    pub fn observer(&self) -> Option<ObserverPosition> {
        match (self.latitude, self.longitude) {
            // Ranges were validated on load
            (Some(lat), Some(lon)) => ObserverPosition::new(lat, lon).ok(),
            _ => None,
        }
    }

    /// Display timezone, if configured and valid.
    pub fn display_timezone(&self) -> Option<Tz> {
        self.timezone.as_ref().and_then(|tz| tz.parse().ok())
    }

    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }

    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or(DEFAULT_PLATFORM_CODE)
    }

    pub fn connect_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS))
    }

    pub fn expiry_timeout_ms(&self) -> i64 {
        self.expiry_timeout_ms.unwrap_or(DEFAULT_EXPIRY_TIMEOUT_MS)
    }
}

/// Default config path: `$XDG_CONFIG_HOME/sunwheel/sunwheel.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(base.join("sunwheel").join("sunwheel.toml"))
}

/// Write the commented default configuration file.
fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    std::fs::write(path, DEFAULT_CONFIG_FILE)
        .with_context(|| format!("Failed to write default config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_complete_config() {
        let file = write_config(
            "latitude = 45.78\nlongitude = 15.98\ntimezone = \"Europe/Zagreb\"\n\
             api_host = \"example.test\"\nplatform = \"ps4\"\n\
             connect_timeout_ms = 5000\nexpiry_timeout_ms = 600000\n",
        );
        let config = Config::load_from_path(file.path()).unwrap();

        assert!(config.observer().is_some());
        assert_eq!(config.display_timezone(), Some(chrono_tz::Europe::Zagreb));
        assert_eq!(config.api_host(), "example.test");
        assert_eq!(config.platform(), "ps4");
        assert_eq!(config.connect_timeout(), StdDuration::from_secs(5));
        assert_eq!(config.expiry_timeout_ms(), 600_000);
    }

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let file = write_config("");
        let config = Config::load_from_path(file.path()).unwrap();

        assert!(config.observer().is_none());
        assert_eq!(config.display_timezone(), None);
        assert_eq!(config.api_host(), DEFAULT_API_HOST);
        assert_eq!(config.platform(), DEFAULT_PLATFORM_CODE);
        assert_eq!(config.connect_timeout(), StdDuration::from_secs(20));
        assert_eq!(config.expiry_timeout_ms(), DEFAULT_EXPIRY_TIMEOUT_MS);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let file = write_config("latitude = 95.0\nlongitude = 10.0\n");
        assert!(Config::load_from_path(file.path()).is_err());
    }

    #[test]
    fn rejects_lone_coordinate() {
        let file = write_config("latitude = 45.0\n");
        assert!(Config::load_from_path(file.path()).is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        let file = write_config("timezone = \"Mars/Olympus_Mons\"\n");
        assert!(Config::load_from_path(file.path()).is_err());
    }

    #[test]
    fn rejects_absurd_timeouts() {
        let file = write_config("connect_timeout_ms = 50\n");
        assert!(Config::load_from_path(file.path()).is_err());

        let file = write_config("expiry_timeout_ms = 1000\n");
        assert!(Config::load_from_path(file.path()).is_err());
    }

    #[test]
    fn default_template_parses_and_validates() {
        let file = write_config(DEFAULT_CONFIG_FILE);
        let config = Config::load_from_path(file.path()).unwrap();
        assert!(config.observer().is_some());
    }
}
