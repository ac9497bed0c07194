//! Last-request-wins bookkeeping.
//!
//! Each outgoing request is tagged with a [`Ticket`] carrying the key it was
//! issued for and a generation number. When the response comes back the
//! session asks its [`RequestGate`] whether the ticket is still current; if
//! the key changed (or was cleared) in between, the response is dropped.
//! Underlying requests are never aborted.

/// Identity of one issued request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks the most recently issued key for one kind of request.
#[derive(Debug, Clone)]
pub struct RequestGate<K> {
    current: Option<K>,
    generation: u64,
}

impl<K> Default for RequestGate<K> {
    fn default() -> Self {
        Self {
            current: None,
            generation: 0,
        }
    }
}

impl<K: Clone + PartialEq> RequestGate<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `key`, superseding every earlier ticket.
    pub fn issue(&mut self, key: K) -> Ticket<K> {
        self.generation += 1;
        self.current = Some(key.clone());
        Ticket {
            key,
            generation: self.generation,
        }
    }

    /// Invalidate every outstanding ticket without issuing a new one.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.current = None;
    }

    /// Whether a response for `ticket` may be applied.
    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        ticket.generation == self.generation && self.current.as_ref() == Some(&ticket.key)
    }

    /// A request for the current key is outstanding or was the last one issued.
    pub fn current(&self) -> Option<&K> {
        self.current.as_ref()
    }
}
