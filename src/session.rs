//! Decoder session: one decoder context driven through its whole lifecycle.
//!
//! ```text
//! create ──> Active ──put/get──> Active ──dispose──> Disposed
//! ```
//!
//! `put` queues encoded bytes, `get` runs the stream bootstrap and then asks
//! the module for a frame. Neither blocks: when the module needs more input
//! than is queued, `get` returns `Ok(None)` and the caller retries after the
//! next `put`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use crate::bootstrap::Bootstrap;
use crate::config::DecoderConfig;
use crate::error::DecoderError;
use crate::frame::{extract_frame, Frame};
use crate::module::DecoderModule;
use crate::native::{CodecKind, DecoderHandle, NativeDecoder};
use crate::pull::StreamInput;
use crate::stream_queue::Chunk;

/// Lifecycle state of a [`Decoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Holding a live native decoder context.
    Active,
    /// Context released; every further operation reports [`DecoderError::Disposed`].
    Disposed,
}

/// A decode session bound to one native decoder context.
///
/// The context is released exactly once, by [`dispose`](Self::dispose) or
/// on drop. Dropping a session from inside one of its own native calls is
/// impossible through this API, since every call borrows the session mutably.
pub struct Decoder<N: NativeDecoder> {
    native: Rc<RefCell<N>>,
    codec: CodecKind,
    config: DecoderConfig,
    /// `None` once disposed.
    handle: Option<DecoderHandle>,
    input: StreamInput,
    bootstrap: Bootstrap,
    frames_decoded: u64,
}

impl<N: NativeDecoder> fmt::Debug for Decoder<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("codec", &self.codec)
            .field("handle", &self.handle)
            .field("bootstrap", &self.bootstrap.state())
            .field("queued_bytes", &self.input.queued_bytes())
            .field("frames_decoded", &self.frames_decoded)
            .finish()
    }
}

impl<N: NativeDecoder> Decoder<N> {
    /// Create a session for `codec` with default settings.
    pub fn create(module: &DecoderModule<N>, codec: CodecKind) -> Result<Self, DecoderError> {
        Self::create_with_config(module, codec, DecoderConfig::default())
    }

    /// Create a session from a codec name. Unknown names fail before the
    /// native module is touched.
    pub fn create_named(module: &DecoderModule<N>, codec: &str) -> Result<Self, DecoderError> {
        let codec = codec.parse()?;
        Self::create(module, codec)
    }

    /// Create a session with explicit settings. A configured log level is
    /// applied to the module only once the native context exists.
    pub fn create_with_config(
        module: &DecoderModule<N>,
        codec: CodecKind,
        config: DecoderConfig,
    ) -> Result<Self, DecoderError> {
        let native = module.shared_native();
        let handle = native
            .try_borrow_mut()
            .map_err(|_| DecoderError::Busy)?
            .create_decoder(codec)
            .ok_or(DecoderError::CreateFailed(codec))?;
        info!(
            codec = %codec,
            native = codec.native_name(),
            handle = handle.get(),
            "decoder created"
        );

        let log_level = config.log_level;
        let decoder = Self {
            native,
            codec,
            config,
            handle: Some(handle),
            input: StreamInput::new(),
            bootstrap: Bootstrap::new(),
            frames_decoded: 0,
        };
        if let Some(level) = log_level {
            module.apply_log_level(Some(level))?;
        }
        Ok(decoder)
    }

    /// Queue encoded bytes for decoding.
    ///
    /// The bytes are copied. Submitting the same buffer twice feeds it twice.
    /// If holding the bytes would exceed the configured limit, or memory for
    /// the copy cannot be reserved, the input is dropped and
    /// [`DecoderError::AllocationFailed`] is returned; nothing is queued.
    pub fn put(&mut self, bytes: &[u8]) -> Result<(), DecoderError> {
        self.ensure_active()?;
        if bytes.is_empty() {
            return Ok(());
        }

        let held = self.held_bytes();
        let limit = self.config.max_queued_bytes;
        let rejected = DecoderError::AllocationFailed {
            requested: bytes.len(),
            queued: held,
            limit,
        };
        if held.saturating_add(bytes.len()) > limit {
            debug!(requested = bytes.len(), held, limit, "put rejected: queue limit");
            return Err(rejected);
        }

        let mut data = Vec::new();
        if data.try_reserve_exact(bytes.len()).is_err() {
            return Err(rejected);
        }
        data.extend_from_slice(bytes);
        self.input.push(Chunk::new(data));

        trace!(len = bytes.len(), queued = self.input.queued_bytes(), "put");
        Ok(())
    }

    /// Fetch the next decoded frame.
    ///
    /// `Ok(None)` means "not ready": either stream parameters are still
    /// unknown or the module has no complete frame yet. Supply more input
    /// and call again. Fails with [`DecoderError::Busy`] while a borrow from
    /// [`DecoderModule::native`] is alive.
    pub fn get(&mut self) -> Result<Option<Frame>, DecoderError> {
        let handle = self.ensure_active()?;
        let mut native = self.native.try_borrow_mut().map_err(|_| DecoderError::Busy)?;

        if !self.bootstrap.resolve(&mut *native, handle, &mut self.input) {
            return Ok(None);
        }

        let addr = match native.get_frame(handle, &mut self.input) {
            Some(addr) => addr,
            None => {
                trace!(queued = self.input.queued_bytes(), "no frame available");
                return Ok(None);
            }
        };

        let frame = extract_frame(&mut *native, addr)?;
        self.frames_decoded += 1;
        debug!(
            width = frame.width,
            height = frame.height,
            frames = self.frames_decoded,
            "frame decoded"
        );
        Ok(Some(frame))
    }

    /// Release the native decoder context. Further calls are no-ops.
    ///
    /// If the module is borrowed elsewhere the context cannot be released;
    /// the session stays active and `dispose` can be called again later.
    pub fn dispose(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        let Ok(mut native) = self.native.try_borrow_mut() else {
            warn!(
                codec = %self.codec,
                handle = handle.get(),
                "native module busy, decoder not released"
            );
            return;
        };

        native.release_decoder(handle);
        drop(native);
        self.handle = None;
        self.input.clear();
        info!(
            codec = %self.codec,
            handle = handle.get(),
            frames = self.frames_decoded,
            "decoder disposed"
        );
    }

    /// The codec this session decodes.
    pub fn codec(&self) -> CodecKind {
        self.codec
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        if self.handle.is_some() {
            SessionState::Active
        } else {
            SessionState::Disposed
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    /// Whether the module has resolved width, height and format.
    pub fn stream_info_ready(&self) -> bool {
        self.bootstrap.is_resolved()
    }

    /// Bytes queued and not yet handed to the module.
    pub fn queued_bytes(&self) -> usize {
        self.input.queued_bytes()
    }

    /// Total bytes handed to the module, counting bootstrap replays.
    pub fn consumed_bytes(&self) -> u64 {
        self.input.read_offset()
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    fn held_bytes(&self) -> usize {
        self.input.queued_bytes() + self.input.replay_bytes()
    }

    fn ensure_active(&self) -> Result<DecoderHandle, DecoderError> {
        self.handle.ok_or(DecoderError::Disposed)
    }
}

impl<N: NativeDecoder> Drop for Decoder<N> {
    fn drop(&mut self) {
        self.dispose();
    }
}
