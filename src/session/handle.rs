//! Monitoring handle for a spawned session worker

use tokio::task::JoinHandle;

use crate::common::{Error, Result};
use crate::driver::Summary;

/// Handle to a running listener session
///
/// With `link` set, dropping the handle aborts the worker. An aborted
/// worker stops at its next await and the listener's `terminate` is not
/// called, so keep the handle alive (or spawn with `link = false`) when
/// the session must run to completion unattended.
#[derive(Debug)]
pub struct SessionHandle {
    task: Option<JoinHandle<Result<Summary>>>,
    link: bool,
}

impl SessionHandle {
    pub(crate) fn new(task: JoinHandle<Result<Summary>>, link: bool) -> Self {
        Self {
            task: Some(task),
            link,
        }
    }

    /// Wait for the worker to exit
    ///
    /// Resolves to the summary on a normal exit, or to the error that
    /// aborted the session, callback failures included.
    pub async fn join(mut self) -> Result<Summary> {
        let Some(task) = self.task.take() else {
            return Err(Error::Worker("session already joined".to_string()));
        };
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(Error::Worker("session aborted".to_string())),
            Err(e) => Err(Error::Worker(format!("session worker panicked: {}", e))),
        }
    }

    /// Abort the worker at its next suspension point
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn is_linked(&self) -> bool {
        self.link
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if self.link {
            if let Some(task) = &self.task {
                if !task.is_finished() {
                    tracing::debug!("Session handle dropped, aborting linked worker");
                    task.abort();
                }
            }
        }
    }
}
