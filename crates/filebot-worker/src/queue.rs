//! FIFO work queue owned by the dispatcher.

use std::collections::VecDeque;

use filebot_core::types::JobUnit;

/// Default starting capacity when none is given.
const DEFAULT_CAPACITY: usize = 16;

/// Ordered, growable queue; the item removed is always the oldest present.
///
/// Capacity doubles whenever a push finds the queue full.
#[derive(Debug, Clone)]
pub struct WorkQueue<T = JobUnit> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl<T> WorkQueue<T> {
    /// Create an empty queue with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue able to hold `capacity` items before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an item at the tail.
    pub fn push(&mut self, item: T) {
        if self.items.len() >= self.capacity {
            self.grow();
        }
        self.items.push_back(item);
    }

    /// Remove the oldest item, or `None` when empty.
    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Number of queued items.
    pub fn size(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current capacity before the next doubling.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate from head to tail without removing anything.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    fn grow(&mut self) {
        let new_capacity = self.capacity * 2;
        self.items.reserve(new_capacity - self.items.len());
        tracing::trace!(from = self.capacity, to = new_capacity, "Growing work queue");
        self.capacity = new_capacity;
    }
}

impl<T> Extend<T> for WorkQueue<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = WorkQueue::with_capacity(4);
        queue.push("a");
        queue.push("b");
        queue.push("c");

        assert_eq!(queue.size(), 3);
        assert_eq!(queue.pop_front(), Some("a"));
        assert_eq!(queue.pop_front(), Some("b"));
        assert_eq!(queue.pop_front(), Some("c"));
        assert_eq!(queue.pop_front(), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_growth_keeps_every_item_in_order() {
        let mut queue = WorkQueue::with_capacity(2);
        for i in 0..37 {
            queue.push(i);
        }

        assert_eq!(queue.size(), 37);
        assert!(queue.capacity() >= 37);
        assert_eq!(queue.capacity(), 64);
        let drained: Vec<i32> = std::iter::from_fn(|| queue.pop_front()).collect();
        assert_eq!(drained, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_interleaved_push_pop() {
        let mut queue = WorkQueue::with_capacity(1);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.pop_front(), Some(1));
        queue.push(3);
        queue.push(4);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut queue = WorkQueue::with_capacity(0);
        assert_eq!(queue.capacity(), 1);
        queue.push(JobUnit::new("A", 1).unwrap());
        queue.push(JobUnit::new("B", 2).unwrap());
        assert_eq!(queue.capacity(), 2);
        assert_eq!(queue.pop_front().unwrap().job_ref, "A");
    }
}
