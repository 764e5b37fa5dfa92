//! Command-line argument parsing.
//!
//! Hand-rolled parser producing a [`CliAction`] so main.rs stays a plain
//! dispatch table. Unknown arguments fall through to the help screen instead
//! of erroring.

/// Parsed command-line invocation.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Refresh every tracked location once and report phases and staleness.
    Status {
        debug_enabled: bool,
        config_path: Option<String>,
    },
    /// Print the solar ephemeris for the configured observer.
    Sun {
        debug_enabled: bool,
        date: Option<String>,
        config_path: Option<String>,
    },
    /// Print the reconstructed cycle boundary schedule.
    Cycles {
        debug_enabled: bool,
        date: Option<String>,
        config_path: Option<String>,
    },
    /// Display help information and exit.
    ShowHelp,
    /// Display version information and exit.
    ShowVersion,
    /// Show help due to an unknown argument and exit nonzero.
    ShowHelpDueToUnknown { unknown: String },
}

/// Parse raw arguments (without the program name).
pub fn parse_args(args: &[String]) -> CliAction {
    let mut debug_enabled = false;
    let mut config_path: Option<String> = None;
    let mut date: Option<String> = None;
    let mut command: Option<&str> = None;

    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return CliAction::ShowHelp,
            "-V" | "--version" => return CliAction::ShowVersion,
            "-d" | "--debug" => debug_enabled = true,
            "--config" => match iter.next() {
                Some(path) => config_path = Some(path.clone()),
                None => {
                    return CliAction::ShowHelpDueToUnknown {
                        unknown: "--config requires a path".to_string(),
                    };
                }
            },
            "--date" => match iter.next() {
                Some(value) => date = Some(value.clone()),
                None => {
                    return CliAction::ShowHelpDueToUnknown {
                        unknown: "--date requires YYYY-MM-DD".to_string(),
                    };
                }
            },
            "status" | "sun" | "cycles" if command.is_none() => {
                command = Some(arg.as_str());
            }
            other => {
                return CliAction::ShowHelpDueToUnknown {
                    unknown: other.to_string(),
                };
            }
        }
    }

    match command {
        Some("sun") => CliAction::Sun {
            debug_enabled,
            date,
            config_path,
        },
        Some("cycles") => CliAction::Cycles {
            debug_enabled,
            date,
            config_path,
        },
        // `status` and the bare invocation behave the same
        _ => CliAction::Status {
            debug_enabled,
            config_path,
        },
    }
}

/// Print the help screen.
pub fn print_help() {
    println!("sunwheel v{}", env!("CARGO_PKG_VERSION"));
    println!("Temporal cycle engine: solar ephemeris and remote game cycle tracking");
    println!();
    println!("USAGE:");
    println!("    sunwheel [COMMAND] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    status    Refresh tracked locations and report phases (default)");
    println!("    sun       Print sunrise, solar noon and sunset for the observer");
    println!("    cycles    Print the reconstructed cycle schedule");
    println!();
    println!("OPTIONS:");
    println!("    --date <YYYY-MM-DD>    Date for sun/cycles (default: today)");
    println!("    --config <PATH>        Use a specific config file");
    println!("    -d, --debug            Enable debug logging");
    println!("    -h, --help             Print help");
    println!("    -V, --version          Print version");
}

/// Print the version line.
pub fn print_version() {
    println!("sunwheel v{}", env!("CARGO_PKG_VERSION"));
}
