//! Sliding window of the most recent normalized samples.
//!
//! The classifier is a temporal model: it consumes a fixed-length, strictly
//! ordered sequence of frames, so the window must preserve arrival order
//! exactly while evicting the oldest frame once full.
//!
//! Design note: backed by a `VecDeque` for O(1) push-with-eviction rather
//! than rebuilding via slicing on every insert.

use std::collections::VecDeque;

use crate::types::{NormalizedSample, FRAME_SIZE};

/// Bounded FIFO buffer of normalized samples, oldest first.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    frames: VecDeque<NormalizedSample>,
    capacity: usize,
}

impl SlidingWindow {
    /// A window sized for the classifier's frame count.
    pub fn new() -> Self {
        Self::with_capacity(FRAME_SIZE)
    }

    /// A window with a custom capacity (test and tooling use).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting from the front if the window is full.
    pub fn push(&mut self, sample: NormalizedSample) {
        self.frames.push_back(sample);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    /// True when the window holds exactly its capacity of frames.
    pub fn is_full(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The current contents in arrival order, without mutating the window.
    ///
    /// Used for tensor construction; also what keeps the classifier's
    /// oldest-first ordering guarantee observable.
    pub fn snapshot(&self) -> Vec<NormalizedSample> {
        self.frames.iter().copied().collect()
    }

    /// Drop all frames (e.g. on sensor reconnect).
    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self::new()
    }
}
