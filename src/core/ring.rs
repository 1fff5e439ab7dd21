//! Fixed-capacity ring buffer backing every rolling window.
//!
//! Storage never grows past its capacity: once full, each push overwrites
//! the oldest slot and advances the write cursor.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::mem;

/// Bounded FIFO with a write cursor.
///
/// Iteration always runs oldest to newest. The serialized form is a plain
/// ordered array, so persisted histories read like ordinary lists.
///
/// # Example
///
/// ```rust
/// use mindgate::core::BoundedRing;
///
/// let mut ring = BoundedRing::with_capacity(3);
/// for v in 1..=5 {
///     ring.push(v);
/// }
/// assert_eq!(ring.to_vec(), vec![3, 4, 5]);
/// assert_eq!(ring.last(), Some(&5));
/// assert_eq!(ring.nth_from_end(2), Some(&3));
/// ```
#[derive(Clone, Debug)]
pub struct BoundedRing<T> {
    slots: Vec<T>,
    capacity: usize,
    head: usize,
}

impl<T> BoundedRing<T> {
    /// Create an empty ring. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    /// Append a value, returning the evicted oldest value when full.
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.slots.len() < self.capacity {
            self.slots.push(value);
            return None;
        }
        let evicted = mem::replace(&mut self.slots[self.head], value);
        self.head = (self.head + 1) % self.capacity;
        Some(evicted)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.slots.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Newest value.
    pub fn last(&self) -> Option<&T> {
        self.nth_from_end(0)
    }

    /// Value `k` steps back from the newest (`0` is the newest).
    pub fn nth_from_end(&self, k: usize) -> Option<&T> {
        let len = self.slots.len();
        if k >= len {
            return None;
        }
        Some(&self.slots[(self.head + len - 1 - k) % len])
    }

    /// The newest `n` values, oldest first.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &T> + '_ {
        let skip = self.slots.len().saturating_sub(n);
        self.iter().skip(skip)
    }

    /// Change capacity, keeping the newest values that still fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.max(1);
        if capacity == self.capacity {
            return;
        }
        let mut ordered = self.drain_ordered();
        let excess = ordered.len().saturating_sub(capacity);
        ordered.drain(..excess);
        self.slots = ordered;
        self.capacity = capacity;
        self.head = 0;
    }

    fn drain_ordered(&mut self) -> Vec<T> {
        let mut slots = mem::take(&mut self.slots);
        slots.rotate_left(self.head);
        self.head = 0;
        slots
    }
}

impl<T: Clone> BoundedRing<T> {
    /// Copy of the contents, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl BoundedRing<f64> {
    /// Arithmetic mean of the contents, `0.0` when empty.
    pub fn mean(&self) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        self.slots.iter().sum::<f64>() / self.slots.len() as f64
    }
}

impl<T: PartialEq> PartialEq for BoundedRing<T> {
    /// Rings are equal when they hold the same values in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Serialize> Serialize for BoundedRing<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for BoundedRing<T> {
    /// Restores the contents with a capacity equal to their length. Owners
    /// re-apply their configured capacity through [`BoundedRing::set_capacity`].
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let slots = Vec::<T>::deserialize(deserializer)?;
        let capacity = slots.len().max(1);
        Ok(Self {
            slots,
            capacity,
            head: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_below_capacity_keeps_everything() {
        let mut ring = BoundedRing::with_capacity(4);
        assert_eq!(ring.push(1), None);
        assert_eq!(ring.push(2), None);
        assert_eq!(ring.to_vec(), vec![1, 2]);
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn push_past_capacity_evicts_oldest() {
        let mut ring = BoundedRing::with_capacity(3);
        for v in 1..=3 {
            ring.push(v);
        }
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.push(5), Some(2));
        assert_eq!(ring.to_vec(), vec![3, 4, 5]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn nth_from_end_follows_cursor() {
        let mut ring = BoundedRing::with_capacity(3);
        for v in 10..17 {
            ring.push(v);
        }
        assert_eq!(ring.nth_from_end(0), Some(&16));
        assert_eq!(ring.nth_from_end(1), Some(&15));
        assert_eq!(ring.nth_from_end(2), Some(&14));
        assert_eq!(ring.nth_from_end(3), None);
    }

    #[test]
    fn tail_returns_newest_in_order() {
        let mut ring = BoundedRing::with_capacity(5);
        for v in 0..8 {
            ring.push(v);
        }
        assert_eq!(ring.tail(3).copied().collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(ring.tail(10).count(), 5);
    }

    #[test]
    fn mean_of_window() {
        let mut ring: BoundedRing<f64> = BoundedRing::with_capacity(2);
        assert_eq!(ring.mean(), 0.0);
        ring.push(0.2);
        ring.push(0.4);
        ring.push(0.8);
        assert!((ring.mean() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn set_capacity_shrinks_from_oldest() {
        let mut ring = BoundedRing::with_capacity(4);
        for v in 1..=6 {
            ring.push(v);
        }
        ring.set_capacity(2);
        assert_eq!(ring.to_vec(), vec![5, 6]);
        ring.push(7);
        assert_eq!(ring.to_vec(), vec![6, 7]);
    }

    #[test]
    fn set_capacity_grows_without_loss() {
        let mut ring = BoundedRing::with_capacity(2);
        for v in 1..=3 {
            ring.push(v);
        }
        ring.set_capacity(4);
        ring.push(4);
        ring.push(5);
        assert_eq!(ring.to_vec(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn serializes_as_ordered_array() {
        let mut ring = BoundedRing::with_capacity(2);
        for v in 1..=3 {
            ring.push(v);
        }
        assert_eq!(serde_json::to_string(&ring).unwrap(), "[2,3]");

        let back: BoundedRing<i32> = serde_json::from_str("[2,3]").unwrap();
        assert_eq!(back.to_vec(), vec![2, 3]);
        assert_eq!(back.capacity(), 2);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut ring = BoundedRing::with_capacity(0);
        ring.push('a');
        ring.push('b');
        assert_eq!(ring.to_vec(), vec!['b']);
    }
}
