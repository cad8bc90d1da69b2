//! Error types for the decoder driver.
//!
//! Only usage problems and native memory faults are errors. "No frame yet" and
//! "stream info not resolved" are ordinary states and come back as `Ok(None)`;
//! the end-of-stream code returned by the pull callback never leaves the
//! native call boundary.

use thiserror::Error;

use crate::memory::Addr;
use crate::native::CodecKind;

/// Faults raised by the native memory bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Native memory exhausted: cannot allocate {requested} bytes")]
    OutOfMemory { requested: usize },

    #[error("Access of {len} bytes at {addr} is outside linear memory")]
    OutOfBounds { addr: Addr, len: usize },

    #[error("Free of {0} which is not a live allocation")]
    InvalidFree(Addr),
}

/// Errors reported by a decoder session or the module host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    #[error("Unsupported codec kind: {0:?}")]
    UnsupportedCodec(String),

    #[error("Decoder has been disposed")]
    Disposed,

    #[error("Native module is borrowed elsewhere; release it and retry")]
    Busy,

    #[error("Native module failed to create a {0} decoder")]
    CreateFailed(CodecKind),

    #[error("Cannot queue {requested} bytes: {queued} already queued, limit {limit}")]
    AllocationFailed {
        requested: usize,
        queued: usize,
        limit: usize,
    },

    #[error("Unknown log level: {0:?}")]
    UnknownLogLevel(String),

    #[error("Frame dimensions {width}x{height} exceed addressable memory")]
    InvalidFrame { width: u32, height: u32 },

    #[error("Native memory error: {0}")]
    Memory(#[from] MemoryError),
}

impl DecoderError {
    /// True for errors caused by calling the API wrongly; the session stays usable.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DecoderError::UnsupportedCodec(_)
                | DecoderError::Disposed
                | DecoderError::Busy
                | DecoderError::UnknownLogLevel(_)
        )
    }
}
