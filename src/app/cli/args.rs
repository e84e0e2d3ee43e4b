//! Command-line arguments
//!
//! Values left unset here fall back to the configuration file, then to
//! built-in defaults (see [`super::config::RunSettings::resolve`]).

use crate::core::validation::{validate_positive_int, validate_target};
use crate::plugin::api::RunMode;
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "scanorch")]
#[command(about = "Run security scanning tools against a target, in dependency order")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Host name, IP address or URL to scan
    #[arg(
        value_name = "TARGET",
        value_parser = validate_target,
        required_unless_present = "list_plugins"
    )]
    pub target: Option<String>,

    /// Scan types to run
    #[arg(short = 'm', long = "mode", value_enum, value_name = "MODE")]
    pub mode: Option<RunMode>,

    /// Run plugins concurrently on a worker pool
    #[arg(short = 'p', long = "parallel", conflicts_with = "sequential")]
    pub parallel: bool,

    /// Run plugins one at a time (overrides the config file)
    #[arg(long = "sequential")]
    pub sequential: bool,

    /// Maximum concurrent plugins in parallel mode
    #[arg(short = 'w', long = "workers", value_name = "COUNT", value_parser = validate_positive_int)]
    pub workers: Option<usize>,

    /// Directory for raw tool output and reports
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Run only these plugins*
    #[arg(short = 'r', long = "run-only", value_name = "NAMES", action = ArgAction::Append)]
    pub run_only: Vec<String>,

    /// Skip these plugins*
    #[arg(short = 'x', long = "exclude", value_name = "NAMES", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Rebuild reports from previously saved tool output instead of scanning
    #[arg(long = "report-only")]
    pub report_only: bool,

    /// Show what would run without running anything
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// List registered plugins and exit
    #[arg(long = "list-plugins")]
    pub list_plugins: bool,

    /// Do not write report.html
    #[arg(long = "no-html")]
    pub no_html: bool,

    /// Exit with status 2 when any plugin failed
    #[arg(long = "fail-on-error")]
    pub fail_on_error: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Verbose output (can be used multiple times for more verbosity)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (can be used multiple times for less verbosity)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Log level
    #[arg(long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<String>,

    /// Force colored output (overrides TTY detection and NO_COLOR)
    #[arg(long = "color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,
}

impl Args {
    /// Parse with help styling chosen from the raw arguments
    ///
    /// Colour has to be decided before clap renders help or errors, so the
    /// `--color`/`--no-color` flags are looked at ahead of the real parse.
    pub fn try_parse_styled<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let color = Self::color_hint(&args);
        let mut matches = Self::command()
            .styles(crate::core::styles::palette_to_clap(color))
            .color(if color {
                clap::ColorChoice::Always
            } else {
                clap::ColorChoice::Never
            })
            .try_get_matches_from(args)?;
        Self::from_arg_matches_mut(&mut matches)
    }

    fn color_hint(args: &[OsString]) -> bool {
        if args.iter().any(|a| a == "--no-color") {
            false
        } else if args.iter().any(|a| a == "--color") {
            true
        } else {
            std::env::var_os("NO_COLOR").is_none()
                && std::io::IsTerminal::is_terminal(&std::io::stdout())
        }
    }

    /// `-v`/`-q` balance, positive for more output
    pub fn verbosity(&self) -> i8 {
        self.verbose.min(i8::MAX as u8) as i8 - self.quiet.min(i8::MAX as u8) as i8
    }

    /// Colour decision for terminal output, `None` when left to the config
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        }
    }
}
