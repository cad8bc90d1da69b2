//! h26x-sans-io: a sans-I/O driver for callback-based H.264/H.265 decoders
//!
//! This crate drives a precompiled decoder module (a WASM build of a C codec,
//! or any library with the same call contract) from safe Rust. The codec is a
//! black box behind the [`NativeDecoder`] trait; what this crate owns is the
//! handshake around it.
//!
//! # Features
//!
//! - **Sans-I/O Design**: you submit bytes and poll for frames; nothing blocks
//! - **Pull-style input**: the module pulls bytes through [`PullSource`],
//!   with partial-chunk splitting and an exact `EOF` sentinel
//! - **Stream bootstrap**: bytes scanned for stream parameters are replayed
//!   for the first real decode, with no loss or duplication
//! - **Frame extraction**: packed RGBA frames are copied out of native memory
//!   and freed exactly once
//! - **Explicit lifecycle**: decoder contexts are released exactly once, on
//!   `dispose` or drop
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use h26x_sans_io::{CodecKind, DecoderModule};
//!
//! // `native` implements NativeDecoder over the loaded module.
//! let module = DecoderModule::new(native);
//! module.set_log_level("warning")?;
//!
//! let mut decoder = module.create_decoder(CodecKind::H264)?;
//! for packet in packets {
//!     decoder.put(&packet)?;
//!     while let Some(frame) = decoder.get()? {
//!         println!("{}x{} ({} bytes)", frame.width, frame.height, frame.data.len());
//!     }
//! }
//! decoder.dispose();
//! ```
//!
//! # Architecture
//!
//! - [`memory`]: the module's flat address space ([`NativeMemory`], [`LinearMemory`])
//! - [`stream_queue`]: pending input chunks
//! - [`pull`]: the pull callback and the replay buffer
//! - [`bootstrap`]: the "stream info not ready" handshake
//! - [`frame`]: frame layout and extraction
//! - [`session`]: the public per-stream [`Decoder`]
//! - [`module`]: readiness notification and native log routing
//!
//! It does NOT provide:
//! - The codec itself (you provide the module)
//! - Threads or async: everything runs on the caller's thread
//! - Push-style frame delivery: frames are pulled with `get`

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod frame;
pub mod log;
pub mod memory;
pub mod module;
pub mod native;
pub mod pull;
pub mod session;
pub mod stream_queue;

pub use bootstrap::{Bootstrap, BootstrapState};
pub use config::{DecoderConfig, MAX_QUEUED_BYTES};
pub use error::{DecoderError, MemoryError};
pub use frame::{extract_frame, write_frame, Frame, BYTES_PER_PIXEL, FRAME_HEADER_LEN};
pub use log::LogLevel;
pub use memory::{Addr, LinearMemory, NativeMemory};
pub use module::{DecoderModule, ReadyNotifier, ReadyState, NATIVE_LOG_TARGET};
pub use native::{
    codec_id, mktag, CodecKind, DecoderHandle, NativeDecoder, PullSource, EOF_SENTINEL,
};
pub use pull::StreamInput;
pub use session::{Decoder, SessionState};
pub use stream_queue::{ByteStreamQueue, Chunk};
