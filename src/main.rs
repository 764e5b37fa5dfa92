//! CLI dispatch for the sunwheel temporal cycle engine.
//!
//! The engine lives in the library; this binary only parses arguments, loads
//! configuration, runs one command and formats the results for the terminal.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::path::Path;
use std::process::ExitCode;

use sunwheel::args::{self, CliAction};
use sunwheel::{
    log_block_start, log_debug, log_decorated, log_end, log_error, log_indented, log_pipe,
    log_version, log_warning,
};
use sunwheel::config::Config;
use sunwheel::cycle::{
    self, CycleAnchor, CyclePhase, FetchOutcome, Fetcher, ReqwestTransport, StalenessMonitor,
};
use sunwheel::logger::Log;
use sunwheel::solar::{self, PolarPeriod};
use sunwheel::time_source;

fn main() -> ExitCode {
    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    match args::parse_args(&raw_args) {
        CliAction::ShowHelp => {
            args::print_help();
            ExitCode::SUCCESS
        }
        CliAction::ShowVersion => {
            args::print_version();
            ExitCode::SUCCESS
        }
        CliAction::ShowHelpDueToUnknown { unknown } => {
            eprintln!("Unknown argument: {unknown}\n");
            args::print_help();
            ExitCode::FAILURE
        }
        CliAction::Status {
            debug_enabled,
            config_path,
        } => run(debug_enabled, &config_path, |config| run_status(config)),
        CliAction::Sun {
            debug_enabled,
            date,
            config_path,
        } => run(debug_enabled, &config_path, |config| {
            run_sun(config, date.as_deref())
        }),
        CliAction::Cycles {
            debug_enabled,
            date,
            config_path,
        } => run(debug_enabled, &config_path, |config| {
            run_cycles(config, date.as_deref())
        }),
    }
}

/// Shared command scaffolding: logging header, config load, footer.
fn run(debug_enabled: bool, config_path: &Option<String>, body: impl FnOnce(&Config) -> Result<()>) -> ExitCode {
    Log::set_debug(debug_enabled);
    log_version!();

    let loaded = match config_path {
        Some(path) => Config::load_from_path(Path::new(path)),
        None => Config::load(),
    };
    let result = loaded.and_then(|config| body(&config));

    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log_pipe!();
            log_error!("{error:#}");
            ExitCode::FAILURE
        }
    };
    log_end!();
    code
}

/// Resolve the `--date` argument, defaulting to today's UTC date.
fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(raw) => time_source::parse_date(raw).map_err(|e| anyhow!(e)),
        None => Ok(time_source::now().date_naive()),
    }
}

/// Format an instant in the configured display timezone, or UTC.
fn format_instant(instant: DateTime<Utc>, tz: Option<Tz>) -> String {
    match tz {
        Some(tz) => instant
            .with_timezone(&tz)
            .format("%H:%M:%S %Z")
            .to_string(),
        None => instant.format("%H:%M:%S UTC").to_string(),
    }
}

fn format_remaining(until: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let total_seconds = (until - now).num_seconds().max(0);
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m {seconds:02}s")
    }
}

/// One refresh per tracked location, then a phase and staleness report.
fn run_status(config: &Config) -> Result<()> {
    let transport =
        ReqwestTransport::new(config.connect_timeout()).context("Failed to set up transport")?;
    let fetcher = Fetcher::new(Box::new(transport), config.api_host(), config.platform());
    let tz = config.display_timezone();

    for location in cycle::LOCATIONS {
        log_block_start!("{}", location.name);

        let mut anchor = CycleAnchor::new();
        let mut monitor = StalenessMonitor::with_timeout(config.expiry_timeout_ms());
        let outcome = fetcher.refresh(location, &mut anchor);
        let now = time_source::now();

        match outcome {
            FetchOutcome::Success => {
                if let Some((phase, until)) = cycle::phase_at(&anchor, location, now) {
                    log_decorated!(
                        "{} for another {}",
                        location.phase_name(phase),
                        format_remaining(until, now)
                    );
                    log_indented!("flips at {}", format_instant(until, tz));
                    log_indented!("fetches so far: {}", anchor.fetch_count());
                }
            }
            FetchOutcome::NetworkError | FetchOutcome::ParseError => {
                log_warning!(
                    "refresh failed: {}",
                    anchor.last_error().unwrap_or("unknown error")
                );
            }
        }

        if monitor.is_stale(&anchor) {
            log_warning!("cycle data is stale");
        }
    }

    Ok(())
}

/// Solar ephemeris report for the configured observer.
fn run_sun(config: &Config, date: Option<&str>) -> Result<()> {
    let position = config
        .observer()
        .ok_or_else(|| anyhow!("No observer coordinates configured; set latitude/longitude"))?;
    let date = resolve_date(date)?;
    let tz = config.display_timezone();

    log_block_start!(
        "Sun times for {date} at {:.4}, {:.4}",
        position.latitude(),
        position.longitude()
    );

    match solar::compute_ephemeris(date, position) {
        Ok(result) => {
            log_indented!("sunrise    {}", format_instant(result.sunrise, tz));
            log_indented!("solar noon {}", format_instant(result.solar_noon, tz));
            log_indented!("sunset     {}", format_instant(result.sunset, tz));
            let day_length = result.day_length();
            log_indented!(
                "day length {}h {:02}m",
                day_length.num_hours(),
                day_length.num_minutes() % 60
            );
            log_debug!(
                "declination {:.3} deg, hour angle {:.3} deg",
                result.declination_degrees,
                result.hour_angle_degrees
            );
        }
        Err(no_sun) => match no_sun.polar {
            PolarPeriod::PolarDay => log_decorated!("polar day: the sun does not set"),
            PolarPeriod::PolarNight => log_decorated!("polar night: the sun does not rise"),
        },
    }

    Ok(())
}

/// Reconstructed cycle boundary table for one date.
fn run_cycles(config: &Config, date: Option<&str>) -> Result<()> {
    let transport =
        ReqwestTransport::new(config.connect_timeout()).context("Failed to set up transport")?;
    let fetcher = Fetcher::new(Box::new(transport), config.api_host(), config.platform());
    let date = resolve_date(date)?;
    let tz = config.display_timezone();

    for location in cycle::LOCATIONS {
        log_block_start!("{} cycles around {date}", location.name);

        let mut anchor = CycleAnchor::new();
        if !fetcher.refresh(location, &mut anchor).is_success() {
            log_warning!(
                "refresh failed: {}",
                anchor.last_error().unwrap_or("unknown error")
            );
            continue;
        }

        for boundary in cycle::cycles_near(&anchor, location, date) {
            log_indented!(
                "{} {} - {} {}",
                boundary.main_start.format("%m-%d"),
                format_instant(boundary.main_start, tz),
                boundary.main_end.format("%m-%d"),
                format_instant(boundary.main_end, tz)
            );
        }
        if let Some(CyclePhase::Main) = anchor.current_phase() {
            log_debug!("anchor expiry is a {} end", location.main_phase_name);
        }
    }

    Ok(())
}
