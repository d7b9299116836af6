//=========================================================================
// Transition Queue
//=========================================================================
//
// FIFO of transition requests issued by states.
//
// States queue requests here from any lifecycle callback. The owning
// Context drains the queue once the callback has returned, so a request
// made inside on_enter/on_exit is applied only after the transition in
// flight has settled.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use super::StateKey;

//=== Transition Request ==================================================

/// A transient request for a state change.
///
/// Requests are never persisted; they are consumed by the next settle
/// pass of the Context that owns the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionRequest<K: StateKey> {
    /// Switch to `target`, optionally recording the outgoing state in history.
    To { target: K, push_history: bool },

    /// Return to the most recent history entry (or the default state).
    Previous,
}

impl<K: StateKey> TransitionRequest<K> {
    /// Request a transition that pushes the current state onto history.
    pub fn push(target: K) -> Self {
        Self::To {
            target,
            push_history: true,
        }
    }

    /// Request a transition that leaves history untouched.
    pub fn replace(target: K) -> Self {
        Self::To {
            target,
            push_history: false,
        }
    }
}

//=== Transition Queue ====================================================

/// Queue of pending requests plus the "yield to parent" flag.
pub struct TransitionQueue<K: StateKey> {
    queue: VecDeque<TransitionRequest<K>>,
    yielded: bool,
}

impl<K: StateKey> TransitionQueue<K> {
    /// Creates a new empty transition queue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            yielded: false,
        }
    }

    /// Queues a request to be applied once the current callback returns.
    pub fn push(&mut self, request: TransitionRequest<K>) {
        self.queue.push_back(request);
    }

    /// Puts a request back at the head of the queue.
    pub(crate) fn push_front(&mut self, request: TransitionRequest<K>) {
        self.queue.push_front(request);
    }

    /// Removes the oldest request.
    pub fn pop(&mut self) -> Option<TransitionRequest<K>> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of queued requests.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Clears all queued requests and the yield flag.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.yielded = false;
    }

    /// Marks that a state asked to hand control back to the parent.
    pub fn request_yield(&mut self) {
        self.yielded = true;
    }

    /// Returns and resets the yield flag.
    pub fn take_yield(&mut self) -> bool {
        std::mem::take(&mut self.yielded)
    }
}

impl<K: StateKey> Default for TransitionQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Tests ===============================================================
