//! Byte-stream queue feeding the pull callback.
//!
//! Input arrives as caller-submitted chunks and leaves in whatever sizes the
//! decoder asks for, so the head chunk is often only partly consumed. The
//! queue always holds, in order, exactly the submitted bytes that have not
//! yet been handed to the decoder.

use std::collections::VecDeque;

/// An immutable run of input bytes plus how much of it has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
    offset: usize,
}

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    pub fn len(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split off the first `n` unconsumed bytes as their own chunk, leaving
    /// `self` holding the suffix.
    pub fn take_prefix(&mut self, n: usize) -> Chunk {
        let n = n.min(self.len());
        let prefix = self.data[self.offset..self.offset + n].to_vec();
        self.offset += n;
        Chunk::new(prefix)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Chunk::new(data)
    }
}

impl From<&[u8]> for Chunk {
    fn from(data: &[u8]) -> Self {
        Chunk::new(data.to_vec())
    }
}

/// FIFO of pending input chunks.
#[derive(Debug, Default)]
pub struct ByteStreamQueue {
    chunks: VecDeque<Chunk>,
    /// Sum of `Chunk::len` over `chunks`
    queued_bytes: usize,
}

impl ByteStreamQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk at the tail. Empty chunks carry nothing and are dropped.
    pub fn push(&mut self, chunk: Chunk) {
        if chunk.is_empty() {
            return;
        }
        self.queued_bytes += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Re-insert a chunk at the head (partial remainders, bootstrap replay).
    pub fn push_front(&mut self, chunk: Chunk) {
        if chunk.is_empty() {
            return;
        }
        self.queued_bytes += chunk.len();
        self.chunks.push_front(chunk);
    }

    /// Remove the head chunk.
    pub fn pop_front(&mut self) -> Option<Chunk> {
        let chunk = self.chunks.pop_front()?;
        self.queued_bytes -= chunk.len();
        Some(chunk)
    }

    /// Number of chunks queued.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total bytes represented by the queue.
    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.queued_bytes = 0;
    }

    /// Iterate over queued chunks head first.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }
}
