//! Ring Buffer Implementation

use std::collections::VecDeque;

/// Default buffer capacity (1000 samples = ~16 min at 1Hz)
pub const DEFAULT_CAPACITY: usize = 1000;

/// Fixed-capacity circular buffer.
///
/// Items are stored oldest to newest. Pushing into a full buffer evicts the
/// oldest item, so `len()` never exceeds `capacity()`.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: VecDeque<T>,
    /// Capacity of the buffer
    capacity: usize,
    /// Total items written (for statistics)
    total_written: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    /// Create a buffer with default capacity (1000 items)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Push an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.storage.len() == self.capacity {
            self.storage.pop_front()
        } else {
            None
        };
        self.storage.push_back(item);
        self.total_written += 1;
        evicted
    }

    /// Get the number of items currently in the buffer
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.len() as f64 / self.capacity as f64
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        self.storage.back()
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.storage.iter()
    }

    /// Iterate newest to oldest
    pub fn iter_recent(&self) -> impl Iterator<Item = &T> {
        self.storage.iter().rev()
    }

    /// Find the first item (newest first) matching a predicate
    pub fn find_mut<P>(&mut self, mut predicate: P) -> Option<&mut T>
    where
        P: FnMut(&T) -> bool,
    {
        self.storage.iter_mut().rev().find(|item| predicate(item))
    }

    /// Get total items written (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Read the last N items (most recent first)
    pub fn read_last(&self, count: usize) -> Vec<T> {
        self.iter_recent().take(count).cloned().collect()
    }

    /// Read the trailing N items in insertion order (oldest first)
    pub fn tail(&self, count: usize) -> Vec<T> {
        let skip = self.len().saturating_sub(count);
        self.storage.iter().skip(skip).cloned().collect()
    }

    /// Copy all items out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.storage.iter().cloned().collect()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
