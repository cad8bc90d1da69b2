//! Session configuration.

use crate::log::LogLevel;

/// Default cap on input bytes a session will hold before `put` fails (64 MiB).
///
/// Bounds memory when a caller keeps submitting data without draining frames.
pub const MAX_QUEUED_BYTES: usize = 64 * 1024 * 1024;

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum bytes held across the pending queue and the replay buffer.
    pub max_queued_bytes: usize,
    /// Native log threshold to apply when the session is created.
    /// `None` leaves the module's current setting alone.
    pub log_level: Option<LogLevel>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_queued_bytes: MAX_QUEUED_BYTES,
            log_level: None,
        }
    }
}

impl DecoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_queued_bytes(mut self, limit: usize) -> Self {
        self.max_queued_bytes = limit;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }
}
