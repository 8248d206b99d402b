//! Listener that reports every callback through `tracing`
//!
//! Used by the replay command; also handy when embedding a session and
//! only structured logs are wanted.

use crate::common::config::ListenerOptions;
use crate::common::ListenerError;
use crate::driver::Summary;
use crate::event::{BeginData, CancelData, EndData, NodeKind, TestStatus};

use super::{Listener, SessionOutcome};

/// Logs begin/end/cancel callbacks and remembers the final outcome
#[derive(Debug, Default)]
pub struct TracingListener {
    outcome: Option<SessionOutcome>,
}

/// Substate for [`TracingListener`]
#[derive(Debug, Default)]
pub struct TracingState {
    /// Log group and test begins at INFO instead of DEBUG
    verbose: bool,
}

impl TracingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome passed to `terminate`, once the session has finished
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Summary of a successfully completed session
    pub fn summary(&self) -> Option<&Summary> {
        match &self.outcome {
            Some(SessionOutcome::Ok(summary)) => Some(summary),
            _ => None,
        }
    }
}

impl Listener for TracingListener {
    type State = TracingState;

    fn init(&mut self, options: &ListenerOptions) -> Result<TracingState, ListenerError> {
        Ok(TracingState {
            verbose: options.flag("verbose"),
        })
    }

    fn handle_begin(
        &mut self,
        kind: NodeKind,
        data: &BeginData,
        state: &mut TracingState,
    ) -> Result<(), ListenerError> {
        let description = data.payload.description.as_deref().unwrap_or("");
        let depth = data.id.depth();
        if state.verbose {
            tracing::info!(id = %data.id, depth, %kind, "begin {}", description);
        } else {
            tracing::debug!(id = %data.id, depth, %kind, "begin {}", description);
        }
        Ok(())
    }

    fn handle_end(
        &mut self,
        kind: NodeKind,
        data: &EndData,
        _state: &mut TracingState,
    ) -> Result<(), ListenerError> {
        let elapsed_ms = data.payload.elapsed_ms;
        match (kind, data.status()) {
            (NodeKind::Group, _) => {
                tracing::debug!(
                    id = %data.id,
                    size = data.payload.size.unwrap_or(0),
                    elapsed_ms,
                    "group finished"
                );
            }
            (NodeKind::Test, Some(TestStatus::Error { info })) => {
                tracing::warn!(id = %data.id, elapsed_ms, "test failed: {}", info);
            }
            (NodeKind::Test, Some(status)) => {
                tracing::debug!(id = %data.id, elapsed_ms, %status, "test finished");
            }
            (NodeKind::Test, None) => {
                tracing::debug!(id = %data.id, elapsed_ms, "test finished without status");
            }
        }
        Ok(())
    }

    fn handle_cancel(
        &mut self,
        kind: NodeKind,
        data: &CancelData,
        _state: &mut TracingState,
    ) -> Result<(), ListenerError> {
        tracing::warn!(id = %data.id, %kind, reason = %data.reason, "cancelled");
        Ok(())
    }

    fn terminate(
        &mut self,
        outcome: SessionOutcome,
        _state: Option<TracingState>,
    ) -> Result<(), ListenerError> {
        match &outcome {
            SessionOutcome::Ok(summary) => tracing::info!(%summary, "session finished"),
            SessionOutcome::Error(failure) => {
                tracing::error!(class = %failure.class, reason = %failure.reason, "session aborted")
            }
        }
        self.outcome = Some(outcome);
        Ok(())
    }
}
