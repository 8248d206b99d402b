//! Tree-matching driver
//!
//! Rebuilds the test tree from the flat event stream. Each call to
//! `process_subtree` waits for the begin of one node, replays that node's
//! subtree to the listener, and reports back whether its parent may keep
//! iterating siblings.
//!
//! Per node:
//!
//! ```text
//! WAIT_BEGIN -> BEGIN_GROUP -> CHILD_LOOP(1, 2, ..) -> END_GROUP | CANCEL_GROUP
//! WAIT_BEGIN -> BEGIN_TEST  -> WAIT_END_OR_CANCEL   -> END_TEST  | CANCEL_TEST
//! ```

mod inbox;
mod tally;

pub use inbox::Inbox;
pub use tally::{Summary, Tally};

use futures_util::future::BoxFuture;

use crate::common::{Error, Result};
use crate::event::{
    BeginData, BeginPayload, CancelData, EndData, EndPayload, Event, NodeId, NodeKind, Phase,
};
use crate::listener::{CallbackAdapter, Listener};

/// How a subtree resolved
#[derive(Debug)]
enum Resolution {
    /// The node finished; the parent moves on to the next sibling
    Ended,
    /// The parent's end, or a cancel at the parent or above, was observed
    Done(Done),
}

#[derive(Debug)]
enum Done {
    ParentEnded(EndPayload),
    Cancelled { at: NodeId, reason: String },
}

/// Replays one event stream to one listener
pub struct Driver<L: Listener> {
    inbox: Inbox,
    callbacks: CallbackAdapter<L>,
    tally: Tally,
}

impl<L: Listener> Driver<L> {
    pub fn new(inbox: Inbox, callbacks: CallbackAdapter<L>) -> Self {
        Self {
            inbox,
            callbacks,
            tally: Tally::new(),
        }
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackAdapter<L> {
        &mut self.callbacks
    }

    pub fn into_callbacks(self) -> CallbackAdapter<L> {
        self.callbacks
    }

    /// Walk the whole tree from the root and return the summary
    ///
    /// The listener must already be initialized. Any callback failure
    /// aborts the walk; the adapter has finalized the listener by then.
    pub async fn traverse(&mut self) -> Result<Summary> {
        match self.process_subtree(NodeId::root(), None).await? {
            Resolution::Ended => {}
            // The root has no parent or ancestors to signal done
            Resolution::Done(done) => {
                tracing::warn!(?done, "Root resolved with a done signal");
            }
        }
        Ok(self.tally.summary())
    }

    fn process_subtree(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
    ) -> BoxFuture<'_, Result<Resolution>> {
        Box::pin(async move {
            let (exact, event) = self
                .inbox
                .take(|event| accepts_begin(event, &id, parent.as_ref()))
                .await
                .ok_or_else(|| Error::StreamClosed {
                    expecting: format!("begin of {}", id),
                })?;

            let Event { id: from, phase } = event;
            tracing::debug!(%id, %from, exact, "Matched event");

            let resolution = match (exact, phase) {
                (true, Phase::Begin { kind: NodeKind::Group, data }) => {
                    self.run_group(id.clone(), data).await?
                }
                (true, Phase::Begin { kind: NodeKind::Test, data }) => {
                    self.run_test(id.clone(), data).await?
                }
                (true, Phase::Cancel { reason }) => {
                    // Cancelled before it began: the kind is unknown, report as a group
                    self.tally.mark_cancelled();
                    let cancel = CancelData {
                        id: id.clone(),
                        begin: BeginPayload::default(),
                        reason,
                    };
                    self.callbacks.cancel(NodeKind::Group, &cancel)?;
                    Resolution::Ended
                }
                (false, Phase::End { data }) => Resolution::Done(Done::ParentEnded(data)),
                (false, Phase::Cancel { reason }) => {
                    Resolution::Done(Done::Cancelled { at: from, reason })
                }
                (_, phase) => {
                    return Err(Error::protocol(
                        &from,
                        format!("unexpected {:?} while waiting for begin of {}", phase, id),
                    ))
                }
            };

            // No later wait can match anything at or below a resolved node
            self.inbox.retire(&id);
            Ok(resolution)
        })
    }

    async fn run_group(&mut self, id: NodeId, payload: BeginPayload) -> Result<Resolution> {
        let begin = BeginData {
            id: id.clone(),
            payload,
        };
        self.callbacks.begin(NodeKind::Group, &begin)?;

        let mut n = 1;
        loop {
            let child = id.child(n);
            match self.process_subtree(child, Some(id.clone())).await? {
                Resolution::Ended => n += 1,
                Resolution::Done(Done::ParentEnded(payload)) => {
                    tracing::debug!(%id, children = n - 1, "Group ended");
                    self.callbacks
                        .end(NodeKind::Group, &EndData { id, payload })?;
                    return Ok(Resolution::Ended);
                }
                Resolution::Done(Done::Cancelled { at, reason }) => {
                    tracing::debug!(%id, %at, "Group cancelled");
                    self.tally.mark_cancelled();
                    let cancel = CancelData {
                        id: id.clone(),
                        begin: begin.payload,
                        reason: reason.clone(),
                    };
                    self.callbacks.cancel(NodeKind::Group, &cancel)?;

                    // A cancel aimed above this group must also resolve the enclosing levels
                    return if at == id {
                        Ok(Resolution::Ended)
                    } else {
                        Ok(Resolution::Done(Done::Cancelled { at, reason }))
                    };
                }
            }
        }
    }

    async fn run_test(&mut self, id: NodeId, payload: BeginPayload) -> Result<Resolution> {
        let begin = BeginData {
            id: id.clone(),
            payload,
        };
        self.callbacks.begin(NodeKind::Test, &begin)?;

        let (_, event) = self
            .inbox
            .take(|event| accepts_test_result(event, &id).then_some(()))
            .await
            .ok_or_else(|| Error::StreamClosed {
                expecting: format!("end of test {}", id),
            })?;

        match event.phase {
            Phase::End { data } => {
                let status = data
                    .status
                    .clone()
                    .ok_or_else(|| Error::protocol(&id, "test end without a status"))?;
                tracing::debug!(%id, %status, "Test ended");
                self.tally.record(&status);
                self.callbacks
                    .end(NodeKind::Test, &EndData { id, payload: data })?;
            }
            Phase::Cancel { reason } => {
                tracing::debug!(%id, "Test cancelled");
                self.tally.mark_cancelled();
                let cancel = CancelData {
                    id,
                    begin: begin.payload,
                    reason,
                };
                self.callbacks.cancel(NodeKind::Test, &cancel)?;
            }
            Phase::Begin { .. } => {
                return Err(Error::protocol(&id, "begin while waiting for test result"));
            }
        }
        Ok(Resolution::Ended)
    }
}

/// Expectations while a node waits for its begin
///
/// Returns `Some(true)` for events addressed to `id` itself and
/// `Some(false)` for done signals from the parent or an ancestor. The
/// exact-id patterns are checked first.
fn accepts_begin(event: &Event, id: &NodeId, parent: Option<&NodeId>) -> Option<bool> {
    if event.id == *id {
        return match event.phase {
            Phase::Begin { .. } | Phase::Cancel { .. } => Some(true),
            Phase::End { .. } => None,
        };
    }
    match event.phase {
        Phase::End { .. } if parent == Some(&event.id) => Some(false),
        Phase::Cancel { .. } if event.id.is_ancestor_of(id) => Some(false),
        _ => None,
    }
}

/// Expectations while a begun test waits for its end or cancel
fn accepts_test_result(event: &Event, id: &NodeId) -> bool {
    event.id == *id && matches!(event.phase, Phase::End { .. } | Phase::Cancel { .. })
}
