//! Deferred work replayed once after every module set has registered

use super::entry::{BroadcastDirective, PendingInsertion};

/// Append-only list drained exactly once
///
/// After the drain, `push` refuses new items so a late request cannot sit
/// in a queue nobody will ever read again.
#[derive(Debug)]
pub struct ReplayQueue<T> {
    items: Vec<T>,
    replayed: bool,
}

impl<T> Default for ReplayQueue<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            replayed: false,
        }
    }
}

impl<T> ReplayQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the item back when the queue was already replayed
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.replayed {
            return Err(item);
        }
        self.items.push(item);
        Ok(())
    }

    /// Take every item in enqueue order and close the queue
    pub fn drain(&mut self) -> Vec<T> {
        self.replayed = true;
        std::mem::take(&mut self.items)
    }

    pub fn is_replayed(&self) -> bool {
        self.replayed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

/// Insertions waiting for their marker
pub type RetryQueue = ReplayQueue<PendingInsertion>;

/// Modules waiting to be applied to every page
pub type BroadcastQueue = ReplayQueue<BroadcastDirective>;
