//! # Logging Utilities
//!
//! Logging infrastructure for mirage using `tracing`.
//!
//! Standard output carries protocol traffic (JSON requests, rendered
//! responses), so console logs always go to standard error. Logs can also be
//! written to a file, alongside the console or instead of it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mirage_utils::init_logging;
//!
//! // Reads RUST_LOG, MIRAGE_LOG_FORMAT and MIRAGE_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("bridge started");
//! ```
//!
//! The returned [`LoggingGuard`] flushes buffered file output when dropped;
//! keep it alive for as long as the program logs.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g., `RUST_LOG=debug`, `RUST_LOG=mirage_protocol=trace`)
//! - `MIRAGE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `MIRAGE_LOG_FILE`: Optional path of a daily-rolling log file, written in
//!   addition to standard error

use std::env;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "MIRAGE_LOG_FORMAT";
/// Environment variable naming an additional log file
pub const LOG_FILE_ENV: &str = "MIRAGE_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable lines (default)
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    /// Default
    #[default]
    Info,
    Debug,
    /// Most verbose; includes every serialized mirror
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Keeps the background file writer alive; flushes it on drop
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment
///
/// - `RUST_LOG`: filter directives, default `info`
/// - `MIRAGE_LOG_FORMAT`: `json` or `pretty`, default `pretty`
/// - `MIRAGE_LOG_FILE`: optional extra log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `MIRAGE_LOG_FORMAT` holds an unknown format
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.parse()?,
        Err(_) => LogFormat::default(),
    };
    init(format, None, env::var(LOG_FILE_ENV).ok().map(PathBuf::from).as_deref(), true)
}

/// Initialize console logging with an explicit level and format
///
/// `MIRAGE_LOG_FILE` is still honoured.
///
/// ## Example
///
/// ```rust,no_run
/// use mirage_utils::{init_logging_with_level, LogFormat, LogLevel};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    let log_file = env::var(LOG_FILE_ENV).ok().map(PathBuf::from);
    init(format, Some(level.into()), log_file.as_deref(), true)
}

/// Initialize file-only logging
///
/// Nothing is written to the console, which keeps interactive sessions
/// clean. `level` overrides `RUST_LOG` when given.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// cannot be created.
pub fn init_logging_to_file(path: &Path, level: Option<LogLevel>, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    init(format, level.map(Into::into), Some(path), false)
}

/// `~/.mirage/YYYY-MM-DD-mirage.log`, or the same file name in the system
/// temp directory when there is no home directory.
#[must_use]
pub fn default_log_file() -> PathBuf
{
    let file_name = format!("{}-mirage.log", Utc::now().format("%Y-%m-%d"));
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".mirage").join(file_name),
        Err(_) => env::temp_dir().join(file_name),
    }
}

/// Priority: explicit level (CLI flag), then `RUST_LOG`, then `info`.
fn build_filter(explicit_level: Option<Level>) -> EnvFilter
{
    match explicit_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string())),
    }
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(io::stderr().is_terminal())
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    }
}

/// Rolls daily next to console output; file-only logging writes the named
/// file as-is.
fn file_layer(format: LogFormat, filter: EnvFilter, path: &Path, rolling: bool) -> (BoxedLayer, WorkerGuard)
{
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().unwrap_or_default();
    let appender = if rolling {
        tracing_appender::rolling::daily(directory, file_name)
    } else {
        tracing_appender::rolling::never(directory, file_name)
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = match format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    };
    (layer, guard)
}

fn init(format: LogFormat, explicit_level: Option<Level>, log_file: Option<&Path>, console: bool) -> Result<LoggingGuard, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if console {
        layers.push(console_layer(format, build_filter(explicit_level)));
    }

    let file_guard = log_file.map(|path| {
        let (layer, guard) = file_layer(format, build_filter(explicit_level), path, console);
        layers.push(layer);
        guard
    });

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
    Ok(LoggingGuard { _file: file_guard })
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    #[error("Unknown log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    #[error("Unknown log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// A global subscriber is already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}
