//! Session controller
//!
//! A session is one worker task that owns a listener for its whole life:
//! `init`, a full traversal of the event stream, then exactly one
//! `terminate`. The worker's exit value is the summary, or the failure that
//! aborted it.

mod handle;

pub use handle::SessionHandle;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::common::config::{Config, ListenerOptions, SessionConfig};
use crate::common::{CallbackFailure, FailureClass, Result};
use crate::driver::{Driver, Inbox, Summary};
use crate::event::{Event, EventSender};
use crate::listener::{CallbackAdapter, Listener, SessionOutcome};

/// Spawn a listener session on the current tokio runtime
///
/// Returns the producer side of the session's event stream and a handle
/// that monitors the worker. Must be called from within a runtime.
pub fn start<L: Listener>(
    listener: L,
    options: ListenerOptions,
    config: &SessionConfig,
) -> (EventSender, SessionHandle) {
    let (sender, rx) = EventSender::channel();
    let span = tracing::info_span!("listener", session = %config.name);
    let task = tokio::spawn(run(listener, options, rx).instrument(span));
    (sender, SessionHandle::new(task, config.link))
}

/// Spawn a session using the `[session]` and `[options]` tables of a config
pub fn start_with_config<L: Listener>(listener: L, config: &Config) -> (EventSender, SessionHandle) {
    start(listener, config.options.clone(), &config.session)
}

/// Run a listener session to completion on the calling task
///
/// This is the worker body used by [`start`].
pub async fn run<L: Listener>(
    listener: L,
    options: ListenerOptions,
    events: mpsc::UnboundedReceiver<Event>,
) -> Result<Summary> {
    run_with(CallbackAdapter::new(listener), options, events)
        .await
        .map(|(summary, _)| summary)
}

/// Like [`run`], but hands the listener back after a normal finish
pub async fn run_with<L: Listener>(
    mut callbacks: CallbackAdapter<L>,
    options: ListenerOptions,
    events: mpsc::UnboundedReceiver<Event>,
) -> Result<(Summary, L)> {
    tracing::info!("Starting listener session");
    callbacks.init(&options)?;

    let mut driver = Driver::new(Inbox::new(events), callbacks);
    let summary = match driver.traverse().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Listener session aborted: {}", e);
            // Callback failures were finalized by the adapter; this covers a broken stream
            let failure = match e.callback_failure() {
                Some(failure) => failure.clone(),
                None => CallbackFailure::new(FailureClass::Error, e.to_string()),
            };
            driver.callbacks_mut().finalize_on_error(&failure);
            return Err(e);
        }
    };

    driver
        .callbacks_mut()
        .terminate(SessionOutcome::Ok(summary))?;
    tracing::info!(%summary, "Listener session finished");

    Ok((summary, driver.into_callbacks().into_listener()))
}
