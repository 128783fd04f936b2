//! Bounded rolling buffer
//!
//! Fixed-capacity FIFO used for monitor history. Pushing onto a full buffer
//! evicts the oldest entry.

use std::collections::VecDeque;

/// A FIFO buffer that keeps at most `capacity` items
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
    total_pushed: u64,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            total_pushed: 0,
        }
    }

    /// Append an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        self.total_pushed += 1;
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items ever pushed, including evicted ones
    #[must_use]
    pub const fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Check if any item has been evicted
    #[must_use]
    pub const fn was_truncated(&self) -> bool {
        self.total_pushed > self.capacity as u64
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Mutable iteration, oldest first
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + ExactSizeIterator {
        self.items.iter_mut()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
