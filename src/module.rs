//! Module host: the process-wide state around one loaded decoder module.
//!
//! A module finishes initializing asynchronously, so callers register ready
//! callbacks that fire once. It also owns the log threshold shared by every
//! decoder created from it. All of this is single-threaded: the module runs
//! on the caller's thread and nothing here is `Send`.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info, trace, warn};

use crate::config::DecoderConfig;
use crate::error::DecoderError;
use crate::log::LogLevel;
use crate::native::{CodecKind, NativeDecoder};
use crate::session::Decoder;

/// Tracing target used for lines forwarded from the native module.
pub const NATIVE_LOG_TARGET: &str = "h26x_native";

/// One-shot readiness of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    #[default]
    Pending,
    Ready,
}

type ReadyCallback = Box<dyn FnOnce()>;

/// Ready listeners with fire-and-remember semantics.
///
/// Listeners registered while pending wait for [`mark_ready`](Self::mark_ready);
/// listeners registered afterwards are scheduled straight away. Either way
/// they only run when the scheduled queue is drained, in registration order.
#[derive(Default)]
pub struct ReadyNotifier {
    state: ReadyState,
    listeners: Vec<ReadyCallback>,
    scheduled: VecDeque<ReadyCallback>,
}

impl fmt::Debug for ReadyNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyNotifier")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .field("scheduled", &self.scheduled.len())
            .finish()
    }
}

impl ReadyNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReadyState {
        self.state
    }

    pub fn subscribe(&mut self, callback: ReadyCallback) {
        match self.state {
            ReadyState::Pending => self.listeners.push(callback),
            ReadyState::Ready => self.scheduled.push_back(callback),
        }
    }

    /// Transition to `Ready` and schedule every waiting listener.
    /// Returns false if already ready.
    pub fn mark_ready(&mut self) -> bool {
        if self.state == ReadyState::Ready {
            return false;
        }
        self.state = ReadyState::Ready;
        self.scheduled.extend(self.listeners.drain(..));
        true
    }

    /// Next callback due to run.
    pub fn next_scheduled(&mut self) -> Option<ReadyCallback> {
        self.scheduled.pop_front()
    }

    /// Callbacks waiting for the ready transition.
    pub fn waiting(&self) -> usize {
        self.listeners.len()
    }

    /// Callbacks due but not yet run.
    pub fn scheduled(&self) -> usize {
        self.scheduled.len()
    }
}

/// A loaded decoder module and its shared state.
pub struct DecoderModule<N: NativeDecoder> {
    native: Rc<RefCell<N>>,
    ready: RefCell<ReadyNotifier>,
    /// Current native log threshold; `None` when logging is off.
    log_level: Cell<Option<LogLevel>>,
}

impl<N: NativeDecoder> fmt::Debug for DecoderModule<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderModule")
            .field("ready", &*self.ready.borrow())
            .field("log_level", &self.log_level.get())
            .finish()
    }
}

impl<N: NativeDecoder> DecoderModule<N> {
    /// Wrap a native module. It starts out pending until
    /// [`notify_ready`](Self::notify_ready) is called.
    pub fn new(native: N) -> Self {
        Self {
            native: Rc::new(RefCell::new(native)),
            ready: RefCell::new(ReadyNotifier::new()),
            log_level: Cell::new(None),
        }
    }

    /// Create a decoder session for `codec` with default settings.
    pub fn create_decoder(&self, codec: CodecKind) -> Result<Decoder<N>, DecoderError> {
        Decoder::create(self, codec)
    }

    /// Create a decoder session from a codec name such as `"h264"`.
    pub fn create_decoder_named(&self, codec: &str) -> Result<Decoder<N>, DecoderError> {
        Decoder::create_named(self, codec)
    }

    pub fn create_decoder_with_config(
        &self,
        codec: CodecKind,
        config: DecoderConfig,
    ) -> Result<Decoder<N>, DecoderError> {
        Decoder::create_with_config(self, codec, config)
    }

    /// Borrow the native module.
    ///
    /// While the borrow is alive, decoder calls that reach the module fail
    /// with [`DecoderError::Busy`] and `dispose` leaves the context in place.
    pub fn native(&self) -> Ref<'_, N> {
        self.native.borrow()
    }

    /// Mutably borrow the native module. Same restriction as [`native`](Self::native).
    pub fn native_mut(&self) -> RefMut<'_, N> {
        self.native.borrow_mut()
    }

    pub(crate) fn shared_native(&self) -> Rc<RefCell<N>> {
        Rc::clone(&self.native)
    }

    // ------------------------------------------------------------------
    // Readiness
    // ------------------------------------------------------------------

    pub fn is_ready(&self) -> bool {
        self.ready.borrow().state() == ReadyState::Ready
    }

    /// Register a callback for when the module has finished initializing.
    /// If it already has, the callback is scheduled for the next
    /// [`run_scheduled`](Self::run_scheduled).
    pub fn set_ready_callback<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.ready.borrow_mut().subscribe(Box::new(callback));
    }

    /// Record that the module finished initializing. Only the first call has
    /// an effect.
    pub fn notify_ready(&self) {
        let mut ready = self.ready.borrow_mut();
        if ready.mark_ready() {
            info!(scheduled = ready.scheduled(), "decoder module ready");
        }
    }

    /// Run every scheduled ready callback, including ones scheduled by the
    /// callbacks themselves. Returns how many ran.
    pub fn run_scheduled(&self) -> usize {
        let mut ran = 0;
        loop {
            // The borrow must end before the callback runs: it may subscribe again.
            let next = self.ready.borrow_mut().next_scheduled();
            match next {
                Some(callback) => {
                    callback();
                    ran += 1;
                }
                None => break,
            }
        }
        if ran > 0 {
            debug!(ran, "ran ready callbacks");
        }
        ran
    }

    // ------------------------------------------------------------------
    // Logging
    // ------------------------------------------------------------------

    /// Current native log threshold, `None` when disabled.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level.get()
    }

    /// Set the native log threshold by name (`"debug"`, `"warning"`, ...).
    /// `"quiet"` or `"off"` disables native logging.
    pub fn set_log_level(&self, name: &str) -> Result<(), DecoderError> {
        let level = LogLevel::parse_setting(name)?;
        self.apply_log_level(level)
    }

    pub(crate) fn apply_log_level(&self, level: Option<LogLevel>) -> Result<(), DecoderError> {
        let mut native = self.native.try_borrow_mut().map_err(|_| DecoderError::Busy)?;
        match level {
            Some(level) => native.enable_log(level),
            None => native.disable_log(),
        }
        self.log_level.set(level);
        debug!(level = ?level, "native log level set");
        Ok(())
    }

    /// Log sink for the native module.
    ///
    /// Lines above the current threshold (or any line while logging is off)
    /// are dropped; the rest go to `tracing` under [`NATIVE_LOG_TARGET`],
    /// prefixed with the level tag. Returns whether the line was emitted.
    pub fn forward_native_log(&self, raw_level: i32, message: &str) -> bool {
        let threshold = match self.log_level.get() {
            Some(threshold) => threshold,
            None => return false,
        };
        if raw_level > threshold.as_i32() {
            return false;
        }

        let level = LogLevel::from_raw(raw_level);
        let tag = level.tag();
        let message = message.trim_end();
        match level {
            LogLevel::Panic | LogLevel::Fatal | LogLevel::Error => {
                error!(target: NATIVE_LOG_TARGET, "{tag} {message}")
            }
            LogLevel::Warning => warn!(target: NATIVE_LOG_TARGET, "{tag} {message}"),
            LogLevel::Info => info!(target: NATIVE_LOG_TARGET, "{tag} {message}"),
            LogLevel::Verbose | LogLevel::Debug => {
                debug!(target: NATIVE_LOG_TARGET, "{tag} {message}")
            }
            LogLevel::Trace => trace!(target: NATIVE_LOG_TARGET, "{tag} {message}"),
        }
        true
    }
}
