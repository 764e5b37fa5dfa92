//! Remote fetcher: polls the worldstate endpoint and updates the anchor.
//!
//! The transport is injected behind [`HttpTransport`] so refresh logic can be
//! tested without a network. The response body is scanned with a deliberately
//! permissive key/value splitter rather than a strict JSON parser: malformed
//! individual entries must degrade to a sentinel, not abort the whole
//! response.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::time::Duration as StdDuration;

use super::{CycleAnchor, CycleLocation};
use crate::constants::{DEFAULT_CONNECT_TIMEOUT_MS, UNKNOWN_ENTRY, USER_AGENT};
use crate::time_source;

#[cfg(test)]
use mockall::automock;

/// Expiry timestamps arrive as `YYYY-MM-DDTHH:MM:SS.ffffffZ`, always UTC.
const EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Transport-level failure, categorized for the anchor's error string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Timeout,
    Connect(String),
    InvalidRequest(String),
    Io(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "connection timed out"),
            TransportError::Connect(msg) => write!(f, "connect failed: {msg}"),
            TransportError::InvalidRequest(msg) => write!(f, "bad request: {msg}"),
            TransportError::Io(msg) => write!(f, "transfer failed: {msg}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Blocking HTTP GET abstraction injected into the fetcher.
#[cfg_attr(test, automock)]
pub trait HttpTransport: Send + Sync {
    /// Fetch the body at `url`, or a categorized transport error.
    fn get(&self, url: &str) -> Result<String, TransportError>;
}

/// Production transport backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Build a client with the fixed User-Agent and the given connect timeout.
    pub fn new(connect_timeout: StdDuration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Client with the default 20 second timeout.
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(StdDuration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS))
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().map_err(categorize)?;
        let response = response.error_for_status().map_err(categorize)?;
        response.text().map_err(categorize)
    }
}

fn categorize(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_builder() || error.is_request() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Io(error.to_string())
    }
}

/// Result of one refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Anchor updated from a fresh response.
    Success,
    /// Transport failed; prior anchor retained.
    NetworkError,
    /// Response arrived but the anchor fields could not be parsed out of it;
    /// prior anchor retained.
    ParseError,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success)
    }
}

/// Polls worldstate endpoints and writes the results into anchor stores.
pub struct Fetcher {
    transport: Box<dyn HttpTransport>,
    host: String,
    platform: String,
}

impl Fetcher {
    pub fn new(transport: Box<dyn HttpTransport>, host: &str, platform: &str) -> Self {
        Self {
            transport,
            host: host.to_string(),
            platform: platform.to_string(),
        }
    }

    /// Endpoint URL for one location.
    fn url_for(&self, location: &CycleLocation) -> String {
        format!(
            "https://{}/{}/{}",
            self.host, self.platform, location.endpoint_path
        )
    }

    /// Fetch the current cycle state for `location` and update `anchor`.
    ///
    /// Both failure outcomes leave the previous phase/expiry pair in place:
    /// stale data keeps being served rather than reset, and only the error
    /// bookkeeping changes.
    pub fn refresh(&self, location: &CycleLocation, anchor: &mut CycleAnchor) -> FetchOutcome {
        let url = self.url_for(location);
        log_debug!("Refreshing {} from {url}", location.name);

        let body = match self.transport.get(&url) {
            Ok(body) => body,
            Err(error) => {
                anchor.record_failure(error.to_string());
                return FetchOutcome::NetworkError;
            }
        };

        let fields = scan_key_values(&body);

        let expiry = match fields.get(location.expiry_keyword) {
            Some(raw) => match parse_expiry(raw) {
                Ok(instant) => instant,
                Err(_) => {
                    anchor.record_failure(format!(
                        "unparseable {} timestamp: {raw}",
                        location.expiry_keyword
                    ));
                    return FetchOutcome::ParseError;
                }
            },
            None => {
                anchor.record_failure(format!(
                    "response missing {} field",
                    location.expiry_keyword
                ));
                return FetchOutcome::ParseError;
            }
        };

        // The phase flag is best-effort text: anything but the literal
        // "true" counts as the non-main phase.
        let phase_is_main = fields
            .get(location.main_keyword)
            .is_some_and(|value| value.as_str() == "true");

        anchor.record_success(phase_is_main, expiry, time_source::now());
        FetchOutcome::Success
    }
}

/// Parse the fixed expiry timestamp pattern into a UTC instant.
fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, EXPIRY_FORMAT)
        .with_context(|| format!("bad expiry timestamp: {raw}"))?;
    Ok(naive.and_utc())
}

/// Permissive flat key/value scan of a worldstate response body.
///
/// Strips braces and newlines, splits on commas, then splits each item at
/// the first `":` boundary and strips surrounding quotes. Items without that
/// boundary land under the `"unknown"` sentinel key instead of failing the
/// scan. Nested structures therefore degrade to noise entries, which is
/// acceptable: only the two configured keywords are ever read back out.
pub(crate) fn scan_key_values(body: &str) -> HashMap<String, String> {
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | '\n' | '\r'))
        .collect();

    let mut fields = HashMap::new();
    for item in cleaned.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match item.split_once("\":") {
            Some((key, value)) => {
                fields.insert(
                    key.trim().trim_matches('"').to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
            None => {
                fields.insert(UNKNOWN_ENTRY.to_string(), item.trim_matches('"').to_string());
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::{CETUS, CyclePhase};
    use crate::time_source::set_fixed_now;
    use chrono::TimeZone;
    use serial_test::serial;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn fetcher_returning(result: Result<String, TransportError>) -> Fetcher {
        let mut transport = MockHttpTransport::new();
        transport.expect_get().return_once(move |_| result);
        Fetcher::new(Box::new(transport), "api.example.test", "pc")
    }

    #[test]
    fn scan_splits_quoted_keys_and_values() {
        let fields =
            scan_key_values("{\"id\":\"abc123\",\"isDay\":true,\"expiry\":\"2024-05-01T10:00:00.000Z\"}");
        assert_eq!(fields.get("id").map(String::as_str), Some("abc123"));
        assert_eq!(fields.get("isDay").map(String::as_str), Some("true"));
        assert_eq!(
            fields.get("expiry").map(String::as_str),
            Some("2024-05-01T10:00:00.000Z")
        );
    }

    #[test]
    fn scan_degrades_malformed_items_to_sentinel() {
        let fields = scan_key_values("{\"isDay\":false,garbage-no-separator}");
        assert_eq!(fields.get("isDay").map(String::as_str), Some("false"));
        assert_eq!(
            fields.get(UNKNOWN_ENTRY).map(String::as_str),
            Some("garbage-no-separator")
        );
    }

    #[test]
    fn scan_survives_newlines_and_empty_items() {
        let fields = scan_key_values("{\n\"a\":\"1\",,\n\"b\":\"2\"\n}");
        assert_eq!(fields.get("a").map(String::as_str), Some("1"));
        assert_eq!(fields.get("b").map(String::as_str), Some("2"));
    }

    #[test]
    fn parse_expiry_accepts_fractional_seconds() {
        assert_eq!(
            parse_expiry("2024-05-01T10:00:00.000Z").unwrap(),
            utc(2024, 5, 1, 10, 0, 0)
        );
        assert!(parse_expiry("2024-05-01 10:00:00").is_err());
        assert!(parse_expiry("not-a-date").is_err());
    }

    #[test]
    #[serial]
    fn refresh_success_updates_anchor() {
        set_fixed_now(utc(2024, 5, 1, 9, 0, 0));
        let fetcher = fetcher_returning(Ok(
            "{\"isDay\":true,\"expiry\":\"2024-05-01T10:00:00.000Z\"}".to_string()
        ));
        let mut anchor = CycleAnchor::new();

        let outcome = fetcher.refresh(&CETUS, &mut anchor);

        assert_eq!(outcome, FetchOutcome::Success);
        assert_eq!(anchor.current_phase(), Some(CyclePhase::Main));
        assert_eq!(anchor.phase_expiry(), Some(utc(2024, 5, 1, 10, 0, 0)));
        assert_eq!(anchor.fetch_count(), 1);
        assert!(anchor.last_fetch_time().is_some());
        assert_eq!(anchor.last_error(), None);
    }

    #[test]
    fn refresh_network_error_retains_previous_anchor() {
        let mut anchor = CycleAnchor::new();
        anchor.record_success(false, utc(2024, 5, 1, 10, 0, 0), utc(2024, 5, 1, 9, 0, 0));

        let fetcher = fetcher_returning(Err(TransportError::Timeout));
        let outcome = fetcher.refresh(&CETUS, &mut anchor);

        assert_eq!(outcome, FetchOutcome::NetworkError);
        assert!(!anchor.fetch_succeeded());
        assert_eq!(anchor.last_error(), Some("connection timed out"));
        assert_eq!(anchor.phase_expiry(), Some(utc(2024, 5, 1, 10, 0, 0)));
        assert_eq!(anchor.current_phase(), Some(CyclePhase::Last));
    }

    #[test]
    fn refresh_bad_expiry_is_parse_error_without_corruption() {
        let mut anchor = CycleAnchor::new();
        anchor.record_success(true, utc(2024, 5, 1, 10, 0, 0), utc(2024, 5, 1, 9, 0, 0));

        let fetcher = fetcher_returning(Ok(
            "{\"isDay\":false,\"expiry\":\"soon-ish\"}".to_string()
        ));
        let outcome = fetcher.refresh(&CETUS, &mut anchor);

        assert_eq!(outcome, FetchOutcome::ParseError);
        // phase flag must not have been half-applied
        assert_eq!(anchor.current_phase(), Some(CyclePhase::Main));
        assert_eq!(anchor.phase_expiry(), Some(utc(2024, 5, 1, 10, 0, 0)));
        assert_eq!(anchor.fetch_count(), 1);
    }

    #[test]
    fn refresh_missing_expiry_field_is_parse_error() {
        let fetcher = fetcher_returning(Ok("{\"isDay\":true}".to_string()));
        let mut anchor = CycleAnchor::new();

        assert_eq!(fetcher.refresh(&CETUS, &mut anchor), FetchOutcome::ParseError);
        assert!(!anchor.has_anchor());
        assert!(anchor.last_error().unwrap().contains("expiry"));
    }

    #[test]
    fn consecutive_failures_keep_count_and_track_latest_error() {
        let mut anchor = CycleAnchor::new();
        anchor.record_success(true, utc(2024, 5, 1, 10, 0, 0), utc(2024, 5, 1, 9, 0, 0));

        let mut transport = MockHttpTransport::new();
        let mut responses = vec![
            Err(TransportError::Connect("dns failure".to_string())),
            Ok("{\"isDay\":true,\"expiry\":\"garbled\"}".to_string()),
        ]
        .into_iter();
        transport.expect_get().times(2).returning(move |_| {
            responses.next().expect("transport called more than twice")
        });
        let fetcher = Fetcher::new(Box::new(transport), "api.example.test", "pc");

        assert_eq!(fetcher.refresh(&CETUS, &mut anchor), FetchOutcome::NetworkError);
        assert_eq!(fetcher.refresh(&CETUS, &mut anchor), FetchOutcome::ParseError);

        assert_eq!(anchor.fetch_count(), 1);
        assert!(anchor.last_error().unwrap().contains("expiry"));
    }

    #[test]
    fn url_follows_host_platform_location_layout() {
        let fetcher = Fetcher::new(
            Box::new(MockHttpTransport::new()),
            "api.example.test",
            "pc",
        );
        assert_eq!(
            fetcher.url_for(&CETUS),
            "https://api.example.test/pc/cetusCycle"
        );
    }
}
