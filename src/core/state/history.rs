//=========================================================================
// History Stack
//=========================================================================
//
// Bounded record of previously active state keys.
//
// Pushed when a transition leaves a state with history enabled, popped by
// "return to previous". When the bound is reached the oldest entry is
// evicted so back-navigation always has the most recent entries.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use super::StateKey;

//=== History =============================================================

/// Bounded LIFO of state keys, oldest entry at the front.
#[derive(Debug, Clone)]
pub struct History<K: StateKey> {
    entries: VecDeque<K>,
    capacity: usize,
}

impl<K: StateKey> History<K> {
    /// Creates an empty history holding at most `capacity` entries.
    ///
    /// A zero capacity is rejected by the builder before a history is ever
    /// created; here it is clamped to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes `key` as the most recent entry.
    ///
    /// Returns the evicted oldest entry when the bound was exceeded.
    pub fn push(&mut self, key: K) -> Option<K> {
        let evicted = if self.entries.len() == self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(key);
        evicted
    }

    /// Removes and returns the most recent entry.
    pub fn pop(&mut self) -> Option<K> {
        self.entries.pop_back()
    }

    /// Returns the most recent entry without removing it.
    pub fn peek(&self) -> Option<K> {
        self.entries.back().copied()
    }

    /// Drops every entry equal to `key`. Returns how many were removed.
    pub fn remove(&mut self, key: K) -> usize {
        let before = self.entries.len();
        self.entries.retain(|&k| k != key);
        before - self.entries.len()
    }

    pub fn contains(&self, key: K) -> bool {
        self.entries.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.entries.iter()
    }

    /// Snapshot of the entries, oldest first.
    pub fn to_vec(&self) -> Vec<K> {
        self.entries.iter().copied().collect()
    }
}

//=== Tests ===============================================================
