//! Logging setup on top of `log` + `flexi_logger`, plus scoped logger handles
//!
//! The backend is installed once at startup. Components never reach for a
//! global "current plugin" logger; instead they are handed a [`ScopedLogger`]
//! at construction which tags every line with the component's scope.

use std::fmt;
use std::sync::Arc;

// Handle kept so the level can be changed after the config file is read
static LOGGER_HANDLE: std::sync::OnceLock<std::sync::Mutex<flexi_logger::LoggerHandle>> =
    std::sync::OnceLock::new();

/// Errors raised while installing or reconfiguring the logger
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid log specification: {0}")]
    Spec(#[from] flexi_logger::FlexiLoggerError),

    #[error("Logger handle not initialised")]
    NotInitialised,

    #[error("Could not acquire logger handle lock")]
    Poisoned,
}

/// Install the global logging backend
///
/// `log_format` is one of `text` (default), `ext` (adds source location) or
/// `json`. `log_file` of `None` (or the literal `none`) keeps output on stderr.
pub fn init_logging(
    log_level: Option<&str>,
    log_format: Option<&str>,
    log_file: Option<&str>,
    color_enabled: bool,
) -> Result<(), LoggingError> {
    use flexi_logger::{FileSpec, Logger};

    let level_str = log_level.unwrap_or("info");
    let format_type = log_format.unwrap_or("text");

    let mut logger = Logger::try_with_str(level_str)?;

    logger = match format_type {
        "json" => logger.format(json_format),
        "ext" if color_enabled => logger.format(extended_color_format),
        "ext" => logger.format(extended_format),
        _ if color_enabled => logger.format(simple_color_format),
        _ => logger.format(simple_format),
    };

    if let Some(file_path) = log_file.filter(|f| !f.eq_ignore_ascii_case("none")) {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(std::sync::Mutex::new(handle));

    Ok(())
}

/// Change the active log level at runtime
///
/// Only the level can be changed once the backend is running; format and
/// file destination are fixed at [`init_logging`] time.
pub fn set_log_level(log_level: &str) -> Result<(), LoggingError> {
    let handle_mutex = LOGGER_HANDLE.get().ok_or(LoggingError::NotInitialised)?;
    let mut handle = handle_mutex.lock().map_err(|_| LoggingError::Poisoned)?;
    handle.parse_and_push_temp_spec(log_level)?;
    Ok(())
}

/// Map a `-v`/`-q` balance onto a level name
pub fn level_for_verbosity(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Logging handle bound to one component
///
/// Cheap to clone. `child` derives a nested scope, e.g. the scheduler hands
/// `scheduler/subfinder` to the plugin it constructs.
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    scope: Arc<str>,
    target: Arc<str>,
}

impl ScopedLogger {
    pub fn new(scope: impl Into<String>) -> Self {
        let scope = scope.into();
        let target = format!("scanorch::{}", scope.replace('/', "::"));
        Self {
            scope: Arc::from(scope),
            target: Arc::from(target),
        }
    }

    pub fn child(&self, name: &str) -> Self {
        Self::new(format!("{}/{}", self.scope, name))
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Log target, so `scanorch::scheduler=debug` filters one component
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: log::Level, args: fmt::Arguments<'_>) {
        log::log!(target: self.target(), level, "[{}] {}", self.scope, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(log::Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(log::Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(log::Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(log::Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(log::Level::Trace, args);
    }
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

fn level_colored(level: log::Level) -> colored::ColoredString {
    use colored::Colorize;

    match level {
        log::Level::Error => "ERR".red().bold(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Info => "INF".green(),
        log::Level::Debug => "DBG".blue(),
        log::Level::Trace => "TRC".magenta(),
    }
}

// "YYYY-MM-DD HH:mm:ss.fff INF message"
fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored(record.level()),
        record.args()
    )
}

// "YYYY-MM-DD HH:mm:ss.fff INF message (scheduler/engine.rs:42)"
fn extended_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        source_location(record)
    )
}

fn extended_color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::Colorize;

    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored(record.level()),
        record.args(),
        source_location(record).dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::json;

    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": source_location(record)
    });

    match serde_json::to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

/// Prefer the source file recorded by `log`, fall back to the target
fn source_location(record: &log::Record) -> String {
    match record.module_path() {
        Some(module) => format_target_as_path(module, record.line()),
        None => format_target_as_path(record.target(), record.line()),
    }
}

// scanorch::scheduler::engine -> scheduler/engine.rs
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = if let Some(without_prefix) = target.strip_prefix("scanorch::") {
        without_prefix.replace("::", "/") + ".rs"
    } else {
        target.replace("::", "/")
    };

    match line {
        Some(line_num) => format!("{}:{}", path_like, line_num),
        None => path_like,
    }
}
