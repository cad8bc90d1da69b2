//! Severity levels understood by the decoder module's logger.
//!
//! Eight levels with a stride of 8; a lower number is more severe, and a
//! message is emitted when its level is numerically at or below the
//! configured threshold.

use std::fmt;
use std::str::FromStr;

use crate::error::DecoderError;

/// Severity of a native log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum LogLevel {
    Panic = 0,
    Fatal = 8,
    Error = 16,
    Warning = 24,
    Info = 32,
    Verbose = 40,
    Debug = 48,
    Trace = 56,
}

impl LogLevel {
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Panic,
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    /// Numeric value passed across the call boundary.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a raw native level onto the closest named level.
    ///
    /// Values between two levels round towards the less severe one, values
    /// past `Trace` clamp to `Trace` and negative values to `Panic`.
    pub fn from_raw(raw: i32) -> LogLevel {
        let idx = (raw.max(0).saturating_add(7) / 8).min(7) as usize;
        LogLevel::ALL[idx]
    }

    /// Prefix prepended to each forwarded log line.
    pub fn tag(self) -> &'static str {
        match self {
            LogLevel::Panic => "[panic]",
            LogLevel::Fatal => "[fatal]",
            LogLevel::Error => "[err]",
            LogLevel::Warning => "[warn]",
            LogLevel::Info => "[info]",
            LogLevel::Verbose => "[verbose]",
            LogLevel::Debug => "[debug]",
            LogLevel::Trace => "[trace]",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Whether a message at `level` passes this threshold.
    pub fn allows(self, level: LogLevel) -> bool {
        level <= self
    }

    /// Parse a `set_log_level` argument. `quiet` and `off` disable logging
    /// and come back as `None`.
    pub fn parse_setting(name: &str) -> Result<Option<LogLevel>, DecoderError> {
        match name.to_ascii_lowercase().as_str() {
            "quiet" | "off" => Ok(None),
            other => other.parse().map(Some),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "panic" => Ok(LogLevel::Panic),
            "fatal" => Ok(LogLevel::Fatal),
            "error" | "err" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "verbose" => Ok(LogLevel::Verbose),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(DecoderError::UnknownLogLevel(s.to_string())),
        }
    }
}
