//! Listener capability set
//!
//! A listener receives the replayed test tree one callback at a time. Its
//! substate is created by `init`, threaded through every handler by
//! exclusive reference, and consumed by `terminate`.

mod adapter;
mod tracing_listener;

pub use adapter::CallbackAdapter;
pub use tracing_listener::TracingListener;

use crate::common::config::ListenerOptions;
use crate::common::{CallbackFailure, ListenerError};
use crate::driver::Summary;
use crate::event::{BeginData, CancelData, EndData, NodeKind};

/// How the session ended, as reported to `terminate`
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// Traversal completed; carries the aggregated counts
    Ok(Summary),
    /// A callback failed (or the stream broke) and the session is aborting
    Error(CallbackFailure),
}

impl SessionOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Callback handler driven by a listener session
///
/// Handlers may fail by returning `Err` or by panicking; either aborts the
/// session after a single `terminate(SessionOutcome::Error(..))`.
pub trait Listener: Send + 'static {
    /// Callback-owned substate
    type State: Send + 'static;

    /// Create the initial substate
    fn init(&mut self, options: &ListenerOptions) -> Result<Self::State, ListenerError>;

    fn handle_begin(
        &mut self,
        kind: NodeKind,
        data: &BeginData,
        state: &mut Self::State,
    ) -> Result<(), ListenerError>;

    fn handle_end(
        &mut self,
        kind: NodeKind,
        data: &EndData,
        state: &mut Self::State,
    ) -> Result<(), ListenerError>;

    fn handle_cancel(
        &mut self,
        kind: NodeKind,
        data: &CancelData,
        state: &mut Self::State,
    ) -> Result<(), ListenerError>;

    /// Finalize the session; called exactly once
    ///
    /// `state` is `None` only when `init` itself failed.
    fn terminate(
        &mut self,
        outcome: SessionOutcome,
        state: Option<Self::State>,
    ) -> Result<(), ListenerError>;
}
