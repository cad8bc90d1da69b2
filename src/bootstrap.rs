//! Stream bootstrap: the "stream info not ready" handshake.
//!
//! The module finds width, height and pixel format lazily by scanning the
//! leading bytes of the stream. Those bytes are consumed through the pull
//! callback during the scan but are needed again for the first real decode,
//! so [`StreamInput`] keeps them until the scan succeeds and then puts them
//! back at the head of the queue.

use tracing::{debug, warn};

use crate::native::{DecoderHandle, NativeDecoder, EOF_SENTINEL};
use crate::pull::StreamInput;

/// Whether the module knows the stream parameters yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapState {
    #[default]
    Unresolved,
    /// Terminal: never reverts for the lifetime of a decoder context.
    Resolved,
}

/// Drives the bootstrap handshake for one decoder context.
#[derive(Debug, Default)]
pub struct Bootstrap {
    state: BootstrapState,
    /// Number of `find_stream_info` scans issued
    attempts: u32,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn is_resolved(&self) -> bool {
        self.state == BootstrapState::Resolved
    }

    /// Number of stream info scans issued so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Try to move to `Resolved`. Returns whether stream info is known.
    ///
    /// While unresolved, previously scanned bytes are replayed ahead of any
    /// new input and the module is asked to scan again. A `false` return is
    /// the "not ready" steady state: the caller should supply more input and
    /// retry.
    pub fn resolve<N>(
        &mut self,
        native: &mut N,
        handle: DecoderHandle,
        input: &mut StreamInput,
    ) -> bool
    where
        N: NativeDecoder + ?Sized,
    {
        if self.is_resolved() {
            return true;
        }

        if native.stream_info_ready(handle) {
            self.finish(input);
            return true;
        }

        input.requeue_replay();
        self.attempts += 1;
        let ret = native.find_stream_info(handle, &mut *input);
        if ret < 0 && ret != EOF_SENTINEL {
            warn!(ret, attempt = self.attempts, "find_stream_info failed");
        }

        if native.stream_info_ready(handle) {
            self.finish(input);
            true
        } else {
            debug!(
                attempt = self.attempts,
                held = input.replay_bytes(),
                "stream info not ready"
            );
            false
        }
    }

    fn finish(&mut self, input: &mut StreamInput) {
        // The scanned prefix feeds the first decode; after this nothing is retained.
        input.requeue_replay();
        input.stop_retaining();
        self.state = BootstrapState::Resolved;
        debug!(attempts = self.attempts, queued = input.queued_bytes(), "stream info resolved");
    }
}
