//! Selective receive over the event channel
//!
//! Events that do not match the current expectation are parked in arrival
//! order and offered again on every later take, so an early event for a
//! sibling or descendant is never lost. Once a subtree is retired its
//! parked events are dropped, and so are any that arrive for it later.

use std::collections::{HashSet, VecDeque};

use tokio::sync::mpsc;

use crate::event::{Event, NodeId};

/// Inbound queue of a listener session
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<Event>,
    /// Events received but not yet matched, oldest first
    deferred: VecDeque<Event>,
    /// Roots of subtrees that no wait can match any more
    retired: HashSet<NodeId>,
}

impl Inbox {
    pub fn new(rx: mpsc::UnboundedReceiver<Event>) -> Self {
        Self {
            rx,
            deferred: VecDeque::new(),
            retired: HashSet::new(),
        }
    }

    /// Take the oldest event accepted by `select`
    ///
    /// `select` returns `Some` to accept an event. Parked events are tried
    /// first, then new arrivals; rejected arrivals are parked. Returns
    /// `None` once every sender is gone and nothing parked matches.
    pub async fn take<T, F>(&mut self, mut select: F) -> Option<(T, Event)>
    where
        F: FnMut(&Event) -> Option<T>,
    {
        for i in 0..self.deferred.len() {
            if let Some(matched) = select(&self.deferred[i]) {
                if let Some(event) = self.deferred.remove(i) {
                    return Some((matched, event));
                }
            }
        }

        loop {
            let event = self.rx.recv().await?;
            if let Some(matched) = select(&event) {
                return Some((matched, event));
            }
            if self.is_retired(&event.id) {
                tracing::debug!(
                    id = %event.id,
                    phase = event.phase_name(),
                    "Dropping event for finished subtree"
                );
                continue;
            }
            tracing::trace!(
                id = %event.id,
                phase = event.phase_name(),
                parked = self.deferred.len() + 1,
                "Deferring event"
            );
            self.deferred.push_back(event);
        }
    }

    /// Mark the subtree rooted at `id` as finished
    ///
    /// Parked events at or below `id` are dropped.
    pub fn retire(&mut self, id: &NodeId) {
        let before = self.deferred.len();
        self.deferred
            .retain(|event| event.id != *id && !id.is_ancestor_of(&event.id));
        let dropped = before - self.deferred.len();
        if dropped > 0 {
            tracing::debug!(%id, dropped, "Dropped parked events for finished subtree");
        }
        self.retired.insert(id.clone());
    }

    fn is_retired(&self, id: &NodeId) -> bool {
        let path = id.as_slice();
        (0..=path.len()).any(|n| self.retired.contains(&path[..n]))
    }

    /// Number of parked events
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}
