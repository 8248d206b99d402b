//! Producer side of a session's event stream

use tokio::sync::mpsc;

use super::id::NodeId;
use super::types::{BeginPayload, EndPayload, Event, NodeKind};

/// Cloneable handle for pushing events into a listener session
///
/// Sends never block. They return `false` once the session worker has
/// exited and the stream has nowhere to go.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Create a connected sender/receiver pair
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn begin_group(&self, id: impl Into<NodeId>, data: BeginPayload) -> bool {
        self.send(Event::begin(id, NodeKind::Group, data))
    }

    pub fn begin_test(&self, id: impl Into<NodeId>, data: BeginPayload) -> bool {
        self.send(Event::begin(id, NodeKind::Test, data))
    }

    pub fn end(&self, id: impl Into<NodeId>, data: EndPayload) -> bool {
        self.send(Event::end(id, data))
    }

    pub fn cancel(&self, id: impl Into<NodeId>, reason: impl Into<String>) -> bool {
        self.send(Event::cancel(id, reason))
    }

    /// True once the receiving session has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (sender, mut rx) = EventSender::channel();
        assert!(sender.cancel([1], "timeout"));
        assert_eq!(rx.recv().await, Some(Event::cancel([1], "timeout")));

        drop(rx);
        assert!(sender.is_closed());
        assert!(!sender.begin_test([2], BeginPayload::default()));
    }
}
