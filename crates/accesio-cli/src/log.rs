use core::{fmt, str::FromStr};
use std::{env, io, sync::OnceLock, time::Instant};

use ansi_term::{Color, ColorChoice};

macro_rules! log {
    ($level:expr, $($arg:tt)*) => {
        $crate::log::log($level, format_args!($($arg)*));
    };
}

macro_rules! trace {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Trace, $($arg)*);
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Debug, $($arg)*);
    };
}

macro_rules! info {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Info, $($arg)*);
    };
}

macro_rules! warn {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Warn, $($arg)*);
    };
}

#[expect(unused_macros)]
macro_rules! error {
    ($($arg:tt)*) => {
        log!($crate::log::LogLevel::Error, $($arg)*);
    };
}

/// Environment variable read when `--log-level` is not given.
pub const LOG_ENV: &str = "ACCESIO_LOG";

struct Logger {
    max_level: LogLevel,
    color: ColorChoice,
    start: Instant,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Sets up the logger; only the first call has an effect.
///
/// `level` takes precedence over [`LOG_ENV`].
pub fn init(level: Option<LogLevel>) {
    let env_value = env::var(LOG_ENV).ok().filter(|_| level.is_none());
    let env_level = env_value.as_deref().map(str::parse::<LogLevel>);
    let max_level = level
        .or_else(|| env_level.as_ref()?.as_ref().ok().copied())
        .unwrap_or_default();
    let _ = LOGGER.set(Logger {
        max_level,
        color: ColorChoice::detect(&io::stderr()),
        start: Instant::now(),
    });
    if let (Some(value), Some(Err(_))) = (&env_value, &env_level) {
        warn!("ignoring invalid log level, {LOG_ENV}={value:?}");
    }
}

pub fn log(level: LogLevel, message: fmt::Arguments) {
    let Some(logger) = LOGGER.get() else {
        return;
    };
    if level < logger.max_level {
        return;
    }
    let now = logger.start.elapsed();
    let (secs, micros) = (now.as_secs(), now.subsec_micros());
    let level = LevelFormat(level, logger.color);
    eprintln!("[{secs:4}.{micros:06}] {level} {message}");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => return Err("expected trace, debug, info, warn or error".into()),
        };
        Ok(level)
    }
}

struct LevelFormat(LogLevel, ColorChoice);

impl fmt::Display for LevelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (color, msg) = match self.0 {
            LogLevel::Trace => (Color::Magenta, "TRACE"),
            LogLevel::Debug => (Color::Blue, "DEBUG"),
            LogLevel::Info => (Color::Green, " INFO"),
            LogLevel::Warn => (Color::Yellow, " WARN"),
            LogLevel::Error => (Color::Red, "ERROR"),
        };
        write!(f, "{}", self.1.paint(color, msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!("trace".parse(), Ok(LogLevel::Trace));
        assert_eq!("WARN".parse(), Ok(LogLevel::Warn));
        "verbose".parse::<LogLevel>().unwrap_err();
        assert!(LogLevel::Debug < LogLevel::default());
    }

    #[test]
    fn test_level_format() {
        let plain = LevelFormat(LogLevel::Info, ColorChoice::Never).to_string();
        assert_eq!(plain, " INFO");
        let colored = LevelFormat(LogLevel::Error, ColorChoice::Always).to_string();
        assert_eq!(colored, "\x1B[31;1mERROR\x1B[0m");
    }
}
