//! Pull callback adapter.
//!
//! The decoder module does not receive input; it asks for it. Each request
//! comes with a destination buffer, and [`StreamInput::pull`] fills it from
//! the head of the [`ByteStreamQueue`], splitting the head chunk when it is
//! larger than the request.
//!
//! While stream parameters are unknown every byte handed out is also kept in
//! a replay buffer, because the module's parameter scan consumes the same
//! leading bytes that the first real decode needs to see again.

use tracing::trace;

use crate::native::{PullSource, EOF_SENTINEL};
use crate::stream_queue::{ByteStreamQueue, Chunk};

/// Session-side input state: pending bytes plus the replay buffer.
#[derive(Debug)]
pub struct StreamInput {
    queue: ByteStreamQueue,
    /// Chunks handed to the module while stream info was unresolved, oldest first.
    replay: Vec<Chunk>,
    /// Keep consumed bytes for replay (true until stream info resolves).
    retain: bool,
    /// Total bytes handed to the module so far, replays included.
    read_offset: u64,
}

impl Default for StreamInput {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamInput {
    pub fn new() -> Self {
        Self {
            queue: ByteStreamQueue::new(),
            replay: Vec::new(),
            retain: true,
            read_offset: 0,
        }
    }

    /// Queue caller input at the tail.
    pub fn push(&mut self, chunk: Chunk) {
        self.queue.push(chunk);
    }

    /// Bytes waiting to be pulled.
    pub fn queued_bytes(&self) -> usize {
        self.queue.queued_bytes()
    }

    /// Bytes held for replay.
    pub fn replay_bytes(&self) -> usize {
        self.replay.iter().map(Chunk::len).sum()
    }

    pub fn replay_len(&self) -> usize {
        self.replay.len()
    }

    /// Total bytes handed to the module, counting replayed bytes each time.
    pub fn read_offset(&self) -> u64 {
        self.read_offset
    }

    pub fn is_retaining(&self) -> bool {
        self.retain
    }

    /// Stop keeping consumed bytes. Stream info only resolves once, so this
    /// never turns back on.
    pub fn stop_retaining(&mut self) {
        self.retain = false;
    }

    /// Move the replay buffer back to the front of the queue, preserving its
    /// original order, and clear it.
    pub fn requeue_replay(&mut self) {
        if self.replay.is_empty() {
            return;
        }
        trace!(
            chunks = self.replay.len(),
            bytes = self.replay_bytes(),
            "requeueing replay buffer"
        );
        // Walk from the tail so the replay head ends up as the queue head.
        while let Some(chunk) = self.replay.pop() {
            self.queue.push_front(chunk);
        }
    }

    /// Drop all pending and replay data.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.replay.clear();
    }
}

impl PullSource for StreamInput {
    fn pull(&mut self, dest: &mut [u8]) -> i32 {
        // The module speaks i32 lengths.
        let buf_size = dest.len().min(i32::MAX as usize);
        if buf_size == 0 {
            return 0;
        }

        let mut head = match self.queue.pop_front() {
            Some(chunk) => chunk,
            None => {
                trace!(offset = self.read_offset, "pull: no data, signalling EOF");
                return EOF_SENTINEL;
            }
        };

        let consumed = if head.len() <= buf_size {
            head
        } else {
            let prefix = head.take_prefix(buf_size);
            self.queue.push_front(head);
            prefix
        };

        let n = consumed.len();
        dest[..n].copy_from_slice(consumed.remaining());
        trace!(
            offset = self.read_offset,
            len = n,
            first = dest[0],
            last = dest[n - 1],
            "pull"
        );
        self.read_offset += n as u64;

        if self.retain {
            self.replay.push(consumed);
        }
        n as i32
    }
}
