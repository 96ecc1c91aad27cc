//! Hand-off of expansion audio levels to the host.
//!
//! The console appends one level per scheduling quantum; the host drains the
//! buffer with [`SampleBuffer::take`]. Capacity is fixed at construction so a
//! host that stops draining cannot grow memory without bound.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<i32>,
    capacity: usize,
    dropped: u64,
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append a sample, discarding the oldest one when full.
    pub fn push(&mut self, sample: i32) {
        if self.capacity == 0 {
            self.dropped += 1;
            return;
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
            self.dropped += 1;
            if overflow_reported(self.dropped, self.capacity) {
                tracing::warn!(
                    capacity = self.capacity,
                    dropped = self.dropped,
                    "sample buffer overflow, dropping oldest samples"
                );
            }
        }
        self.samples.push_back(sample);
    }

    /// Move every buffered sample out, oldest first.
    pub fn take(&mut self) -> Vec<i32> {
        self.samples.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total samples lost to overflow since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Log once per buffer's worth of losses, starting with the first.
fn overflow_reported(dropped: u64, capacity: usize) -> bool {
    dropped > 0 && (dropped - 1) % capacity as u64 == 0
}
