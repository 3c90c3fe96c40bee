//! Kernel logging
//!
//! The `k*!` macros route through `log()` to the `log` facade; `init()`
//! installs the `env_logger` backend once per host process.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Log target used by the `k*!` macros.
pub const LOG_TARGET: &str = "nexa_emu";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    FATAL,
    ERROR,
    WARN,
    INFO,
    DEBUG,
    TRACE,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::FATAL => "FATAL",
            LogLevel::ERROR => "ERROR",
            LogLevel::WARN => "WARN",
            LogLevel::INFO => "INFO",
            LogLevel::DEBUG => "DEBUG",
            LogLevel::TRACE => "TRACE",
        }
    }

    /// `log` has no fatal level; fatal records go out as errors.
    pub const fn to_level(self) -> log::Level {
        match self {
            LogLevel::FATAL | LogLevel::ERROR => log::Level::Error,
            LogLevel::WARN => log::Level::Warn,
            LogLevel::INFO => log::Level::Info,
            LogLevel::DEBUG => log::Level::Debug,
            LogLevel::TRACE => log::Level::Trace,
        }
    }

    pub const fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::FATAL | LogLevel::ERROR => log::LevelFilter::Error,
            LogLevel::WARN => log::LevelFilter::Warn,
            LogLevel::INFO => log::LevelFilter::Info,
            LogLevel::DEBUG => log::LevelFilter::Debug,
            LogLevel::TRACE => log::LevelFilter::Trace,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("fatal") {
            Some(LogLevel::FATAL)
        } else if value.eq_ignore_ascii_case("error") {
            Some(LogLevel::ERROR)
        } else if value.eq_ignore_ascii_case("warn") || value.eq_ignore_ascii_case("warning") {
            Some(LogLevel::WARN)
        } else if value.eq_ignore_ascii_case("info") {
            Some(LogLevel::INFO)
        } else if value.eq_ignore_ascii_case("debug") {
            Some(LogLevel::DEBUG)
        } else if value.eq_ignore_ascii_case("trace") {
            Some(LogLevel::TRACE)
        } else {
            None
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::INFO
    }
}

/// Install the `env_logger` backend.
///
/// `RUST_LOG` wins over the configured level. Only the first call installs
/// anything; later calls return `false`.
pub fn init(config: &LoggingConfig) -> bool {
    if LOGGER_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return false;
    }

    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.level.to_filter());
    if let Ok(directives) = std::env::var("RUST_LOG") {
        builder.parse_filters(&directives);
    }
    builder.format_timestamp_micros();
    builder.try_init().is_ok()
}

/// Emit one record under `LOG_TARGET`. Backs the `k*!` macros.
pub fn log(level: LogLevel, args: fmt::Arguments<'_>) {
    let level = level.to_level();
    if level <= log::max_level() {
        log::log!(target: LOG_TARGET, level, "{}", args);
    }
}

/// Extract a `log=<level>` or `loglevel=<level>` token from a command line.
pub fn parse_level_directive(cmdline: &str) -> Option<LogLevel> {
    for token in cmdline.split_whitespace() {
        if let Some((key, value)) = token.split_once('=') {
            if key.eq_ignore_ascii_case("log") || key.eq_ignore_ascii_case("loglevel") {
                if let Some(level) = LogLevel::from_str(value) {
                    return Some(level);
                }
            }
        }
    }
    None
}
