//! Call contract of the precompiled decoder module.
//!
//! The codec itself is opaque. What is visible is a handful of entry points
//! keyed by a [`DecoderHandle`], the raw memory primitives of
//! [`NativeMemory`], and the pull callback the module invokes whenever it
//! wants more input bytes.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use crate::error::DecoderError;
use crate::log::LogLevel;
use crate::memory::{Addr, NativeMemory};

/// Build a libav-style four character tag (`MKTAG`).
pub const fn mktag(a: u8, b: u8, c: u8, d: u8) -> i32 {
    (a as i32) | ((b as i32) << 8) | ((c as i32) << 16) | ((d as i32) << 24)
}

/// End-of-stream code returned by the pull callback when no input is queued.
///
/// The module reads it as a signed error code, so the exact value matters:
/// `-MKTAG('E','O','F',' ')`.
pub const EOF_SENTINEL: i32 = -mktag(b'E', b'O', b'F', b' ');

/// libavcodec codec ids the module creates decoders for.
pub mod codec_id {
    pub const H264: u32 = 27;
    pub const HEVC: u32 = 173;
}

/// Codec kinds the module can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    H264,
    H265,
}

impl CodecKind {
    /// Name reported back to callers (`type()` on the session).
    pub fn as_str(self) -> &'static str {
        match self {
            CodecKind::H264 => "h264",
            CodecKind::H265 => "h265",
        }
    }

    /// Name of the module's internal parser/demuxer for this codec.
    pub fn native_name(self) -> &'static str {
        match self {
            CodecKind::H264 => "h264",
            CodecKind::H265 => "hevc",
        }
    }

    pub fn codec_id(self) -> u32 {
        match self {
            CodecKind::H264 => codec_id::H264,
            CodecKind::H265 => codec_id::HEVC,
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = DecoderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "h264" => Ok(CodecKind::H264),
            "h265" | "hevc" => Ok(CodecKind::H265),
            other => Err(DecoderError::UnsupportedCodec(other.to_string())),
        }
    }
}

/// Opaque handle to one decoder context inside the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoderHandle(NonZeroU32);

impl DecoderHandle {
    /// Wrap a raw native context pointer; null yields `None`.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// The pull callback registered with the module.
///
/// `dest` is the module's read buffer; its length is the maximum number of
/// bytes the module will accept. Implementations return the number of bytes
/// written, or [`EOF_SENTINEL`] when nothing is available. They run
/// synchronously on the caller's stack, from inside a native call.
pub trait PullSource {
    fn pull(&mut self, dest: &mut [u8]) -> i32;
}

/// Entry points of the precompiled decoder module.
pub trait NativeDecoder: NativeMemory {
    /// Create a decoder context, or `None` if the module refused.
    fn create_decoder(&mut self, codec: CodecKind) -> Option<DecoderHandle>;

    /// Release a decoder context. Called exactly once per handle.
    fn release_decoder(&mut self, handle: DecoderHandle);

    /// Scan leading bytes (pulled through `input`) for stream parameters.
    /// Returns 0 or a negative libav error code.
    fn find_stream_info(&mut self, handle: DecoderHandle, input: &mut dyn PullSource) -> i32;

    /// Whether the context knows the stream's width, height and format.
    fn stream_info_ready(&self, handle: DecoderHandle) -> bool;

    /// Decode until a frame is available. Returns the address of a packed
    /// frame (see [`crate::frame`]) owned by the caller, or `None`.
    fn get_frame(&mut self, handle: DecoderHandle, input: &mut dyn PullSource) -> Option<Addr>;

    /// Route the module's log output at `level` and below.
    fn enable_log(&mut self, level: LogLevel);

    /// Silence the module's log output.
    fn disable_log(&mut self);
}
