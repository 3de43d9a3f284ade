//! Ordered outbound queue of resampled speech chunks.
//!
//! Assistant speech arrives from the realtime API in small deltas.  Each
//! delta is downsampled and pushed here; the session then drains the queue
//! oldest-first into the avatar client.  The queue has a single owner, so a
//! drain holds `&mut` access until it finishes and no second drain can
//! interleave with it.
//!
//! # Example
//!
//! ```rust
//! use avatar_assistant::audio::{AudioBuffer, ChunkQueue};
//!
//! let mut queue = ChunkQueue::new();
//! queue.push(AudioBuffer::from(vec![1, 2]));
//! queue.push(AudioBuffer::from(vec![3]));
//!
//! let first = queue.pop().unwrap();
//! assert_eq!(first.samples(), &[1, 2]);
//! assert_eq!(queue.drain_in_order().count(), 1);
//! ```

use std::collections::VecDeque;

use super::buffer::AudioBuffer;

/// FIFO of [`AudioBuffer`] chunks awaiting delivery.
#[derive(Debug, Default)]
pub struct ChunkQueue {
    chunks: VecDeque<AudioBuffer>,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk at the back of the queue.
    pub fn push(&mut self, chunk: AudioBuffer) {
        self.chunks.push_back(chunk);
    }

    /// Remove and return the oldest chunk.
    pub fn pop(&mut self) -> Option<AudioBuffer> {
        self.chunks.pop_front()
    }

    /// Remove every queued chunk, oldest first.
    pub fn drain_in_order(&mut self) -> impl Iterator<Item = AudioBuffer> + '_ {
        self.chunks.drain(..)
    }

    /// Discard all queued chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of queued samples across all chunks.
    pub fn queued_samples(&self) -> usize {
        self.chunks.iter().map(AudioBuffer::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
