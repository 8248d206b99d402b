//! Failure funnel around listener callbacks
//!
//! Every capability call goes through [`CallbackAdapter`]. When a call other
//! than `terminate` fails, the adapter makes one best-effort
//! `terminate(SessionOutcome::Error(..))` call, ignores anything that call
//! does wrong, and hands the original failure back to the driver.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::common::config::ListenerOptions;
use crate::common::{CallbackFailure, Error, FailureClass, ListenerError, Operation, Result};
use crate::event::{BeginData, CancelData, EndData, NodeKind};

use super::{Listener, SessionOutcome};

/// Owns a listener and its substate for the duration of one session
pub struct CallbackAdapter<L: Listener> {
    listener: L,
    /// `None` before `init` and after `terminate`
    state: Option<L::State>,
    /// Set once `terminate` has been attempted, successfully or not
    finalized: bool,
}

impl<L: Listener> CallbackAdapter<L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            state: None,
            finalized: false,
        }
    }

    /// Whether `terminate` has already been invoked
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Borrow the listener (e.g. to inspect it after the session)
    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    /// Run `init` and keep the resulting substate
    pub fn init(&mut self, options: &ListenerOptions) -> Result<()> {
        let listener = &mut self.listener;
        match trap(|| listener.init(options)) {
            Ok(state) => {
                self.state = Some(state);
                Ok(())
            }
            Err(failure) => Err(self.abort(Operation::Init, failure)),
        }
    }

    pub fn begin(&mut self, kind: NodeKind, data: &BeginData) -> Result<()> {
        self.dispatch(Operation::HandleBegin, |listener, state| {
            listener.handle_begin(kind, data, state)
        })
    }

    pub fn end(&mut self, kind: NodeKind, data: &EndData) -> Result<()> {
        self.dispatch(Operation::HandleEnd, |listener, state| {
            listener.handle_end(kind, data, state)
        })
    }

    pub fn cancel(&mut self, kind: NodeKind, data: &CancelData) -> Result<()> {
        self.dispatch(Operation::HandleCancel, |listener, state| {
            listener.handle_cancel(kind, data, state)
        })
    }

    /// Invoke `terminate`; a failure here is returned without a second attempt
    pub fn terminate(&mut self, outcome: SessionOutcome) -> Result<()> {
        if self.finalized {
            return Err(Error::Worker("listener already terminated".to_string()));
        }
        self.finalized = true;

        let state = self.state.take();
        let listener = &mut self.listener;
        trap(|| listener.terminate(outcome, state)).map_err(|failure| Error::Callback {
            operation: Operation::Terminate,
            failure,
        })
    }

    /// Best-effort `terminate(error)` for a session that is aborting
    ///
    /// Does nothing if the listener was already finalized.
    pub fn finalize_on_error(&mut self, failure: &CallbackFailure) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        let state = self.state.take();
        let listener = &mut self.listener;
        let outcome = SessionOutcome::Error(failure.clone());
        if let Err(secondary) = trap(|| listener.terminate(outcome, state)) {
            tracing::warn!(
                class = %secondary.class,
                reason = %secondary.reason,
                "Listener terminate failed while aborting; ignoring"
            );
        }
    }

    fn dispatch<F>(&mut self, operation: Operation, call: F) -> Result<()>
    where
        F: FnOnce(&mut L, &mut L::State) -> std::result::Result<(), ListenerError>,
    {
        let Some(state) = self.state.as_mut() else {
            return Err(Error::Worker(format!(
                "listener '{}' called outside an active session",
                operation
            )));
        };

        let listener = &mut self.listener;
        match trap(|| call(listener, state)) {
            Ok(()) => Ok(()),
            Err(failure) => Err(self.abort(operation, failure)),
        }
    }

    fn abort(&mut self, operation: Operation, failure: CallbackFailure) -> Error {
        tracing::error!(
            %operation,
            class = %failure.class,
            reason = %failure.reason,
            "Listener callback failed, finalizing session"
        );
        self.finalize_on_error(&failure);
        Error::Callback { operation, failure }
    }
}

/// Run a callback, converting both `Err` returns and panics into a failure
fn trap<T, F>(call: F) -> std::result::Result<T, CallbackFailure>
where
    F: FnOnce() -> std::result::Result<T, ListenerError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(CallbackFailure::new(FailureClass::Error, error.to_string())),
        Err(payload) => Err(CallbackFailure::new(
            FailureClass::Panic,
            panic_message(payload.as_ref()),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Summary;
    use crate::event::{BeginPayload, NodeId};

    /// Listener whose `handle_begin` and `terminate` can be made to fail
    #[derive(Default)]
    struct Flaky {
        fail_begin: bool,
        panic_begin: bool,
        fail_terminate: bool,
        fail_init: bool,
        terminations: Vec<(bool, Option<u32>)>,
    }

    impl Listener for Flaky {
        type State = u32;

        fn init(&mut self, _options: &ListenerOptions) -> std::result::Result<u32, ListenerError> {
            if self.fail_init {
                return Err("no init".into());
            }
            Ok(0)
        }

        fn handle_begin(
            &mut self,
            _kind: NodeKind,
            _data: &BeginData,
            state: &mut u32,
        ) -> std::result::Result<(), ListenerError> {
            if self.panic_begin {
                panic!("begin exploded");
            }
            if self.fail_begin {
                return Err("begin refused".into());
            }
            *state += 1;
            Ok(())
        }

        fn handle_end(
            &mut self,
            _kind: NodeKind,
            _data: &EndData,
            _state: &mut u32,
        ) -> std::result::Result<(), ListenerError> {
            Ok(())
        }

        fn handle_cancel(
            &mut self,
            _kind: NodeKind,
            _data: &CancelData,
            _state: &mut u32,
        ) -> std::result::Result<(), ListenerError> {
            Ok(())
        }

        fn terminate(
            &mut self,
            outcome: SessionOutcome,
            state: Option<u32>,
        ) -> std::result::Result<(), ListenerError> {
            self.terminations.push((outcome.is_ok(), state));
            if self.fail_terminate {
                return Err("terminate refused".into());
            }
            Ok(())
        }
    }

    fn begin_data() -> BeginData {
        BeginData {
            id: NodeId::from([1]),
            payload: BeginPayload::described("t"),
        }
    }

    #[test]
    fn test_success_threads_state() {
        let mut adapter = CallbackAdapter::new(Flaky::default());
        adapter.init(&ListenerOptions::new()).unwrap();
        adapter.begin(NodeKind::Test, &begin_data()).unwrap();
        adapter.begin(NodeKind::Test, &begin_data()).unwrap();
        adapter
            .terminate(SessionOutcome::Ok(Summary::default()))
            .unwrap();

        assert_eq!(adapter.listener().terminations, vec![(true, Some(2))]);
        assert!(adapter.is_finalized());
    }

    #[test]
    fn test_handler_error_finalizes_once() {
        let mut adapter = CallbackAdapter::new(Flaky {
            fail_begin: true,
            ..Flaky::default()
        });
        adapter.init(&ListenerOptions::new()).unwrap();

        let err = adapter.begin(NodeKind::Group, &begin_data()).unwrap_err();
        match &err {
            Error::Callback { operation, failure } => {
                assert_eq!(*operation, Operation::HandleBegin);
                assert_eq!(failure.class, FailureClass::Error);
                assert_eq!(failure.reason, "begin refused");
            }
            other => panic!("Expected callback error, got {:?}", other),
        }
        assert_eq!(adapter.listener().terminations, vec![(false, Some(0))]);

        // Already finalized: no second terminate
        adapter.finalize_on_error(err.callback_failure().unwrap());
        assert_eq!(adapter.listener().terminations.len(), 1);
    }

    #[test]
    fn test_handler_panic_is_trapped() {
        let mut adapter = CallbackAdapter::new(Flaky {
            panic_begin: true,
            ..Flaky::default()
        });
        adapter.init(&ListenerOptions::new()).unwrap();

        let err = adapter.begin(NodeKind::Test, &begin_data()).unwrap_err();
        let failure = err.callback_failure().unwrap();
        assert_eq!(failure.class, FailureClass::Panic);
        assert_eq!(failure.reason, "begin exploded");
        assert_eq!(adapter.listener().terminations, vec![(false, Some(0))]);
    }

    #[test]
    fn test_secondary_terminate_failure_is_swallowed() {
        let mut adapter = CallbackAdapter::new(Flaky {
            fail_begin: true,
            fail_terminate: true,
            ..Flaky::default()
        });
        adapter.init(&ListenerOptions::new()).unwrap();

        let err = adapter.begin(NodeKind::Test, &begin_data()).unwrap_err();
        // The original failure wins over the terminate failure
        assert_eq!(err.callback_failure().unwrap().reason, "begin refused");
        assert_eq!(adapter.listener().terminations.len(), 1);
    }

    #[test]
    fn test_terminate_failure_is_not_retried() {
        let mut adapter = CallbackAdapter::new(Flaky {
            fail_terminate: true,
            ..Flaky::default()
        });
        adapter.init(&ListenerOptions::new()).unwrap();

        let err = adapter
            .terminate(SessionOutcome::Ok(Summary::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Callback {
                operation: Operation::Terminate,
                ..
            }
        ));
        assert_eq!(adapter.listener().terminations, vec![(true, Some(0))]);
    }

    #[test]
    fn test_init_failure_terminates_without_state() {
        let mut adapter = CallbackAdapter::new(Flaky {
            fail_init: true,
            ..Flaky::default()
        });

        let err = adapter.init(&ListenerOptions::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Callback {
                operation: Operation::Init,
                ..
            }
        ));
        assert_eq!(adapter.listener().terminations, vec![(false, None)]);
    }

    #[test]
    fn test_handler_before_init_is_rejected() {
        let mut adapter = CallbackAdapter::new(Flaky::default());
        let err = adapter.begin(NodeKind::Test, &begin_data()).unwrap_err();
        assert!(matches!(err, Error::Worker(_)));
        assert!(adapter.listener().terminations.is_empty());
    }
}
