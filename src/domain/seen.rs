//! Seen-signature set
//!
//! Remembers which feed entries were already evaluated. Bounded: once
//! `capacity` signatures are held the oldest ones are forgotten first.

use std::collections::{HashSet, VecDeque};

/// Default number of signatures remembered
pub const DEFAULT_SEEN_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
pub struct SeenSignatures {
    set: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl SeenSignatures {
    pub fn new(capacity: usize) -> Self {
        Self {
            set: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.set.contains(signature)
    }

    /// Returns false if the signature was already present
    pub fn insert(&mut self, signature: impl Into<String>) -> bool {
        let signature = signature.into();
        if !self.set.insert(signature.clone()) {
            return false;
        }
        self.order.push_back(signature);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
        true
    }

    pub fn extend<I>(&mut self, signatures: I)
    where
        I: IntoIterator<Item = String>,
    {
        for signature in signatures {
            self.insert(signature);
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SeenSignatures {
    fn default() -> Self {
        Self::new(DEFAULT_SEEN_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut seen = SeenSignatures::default();
        assert!(seen.insert("a"));
        assert!(!seen.insert("a"));
        assert!(seen.contains("a"));
        assert!(!seen.contains("b"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut seen = SeenSignatures::new(3);
        seen.extend(["a", "b", "c", "d"].iter().map(|s| s.to_string()));

        assert_eq!(seen.len(), 3);
        assert!(!seen.contains("a"));
        assert!(seen.contains("b"));
        assert!(seen.contains("d"));
    }

    #[test]
    fn test_duplicate_does_not_refresh_order() {
        let mut seen = SeenSignatures::new(2);
        seen.insert("a");
        seen.insert("b");
        seen.insert("a");
        seen.insert("c");

        assert!(!seen.contains("a"));
        assert!(seen.contains("b"));
        assert!(seen.contains("c"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut seen = SeenSignatures::new(0);
        seen.insert("a");
        assert_eq!(seen.capacity(), 1);
        assert!(seen.contains("a"));
    }
}
