//! Error types for the test listener
//!
//! Callback failures keep the full descriptor handed to `terminate`, so a
//! supervisor joining the session sees the same class, reason and trace.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::event::NodeId;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error type returned by listener callbacks
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the test listener
#[derive(Error, Debug)]
pub enum Error {
    // === Callback Errors ===
    #[error("Listener callback '{operation}' failed: {failure}")]
    Callback {
        operation: Operation,
        failure: CallbackFailure,
    },

    // === Protocol Errors ===
    #[error("Event stream protocol violation at {id}: {reason}")]
    Protocol { id: NodeId, reason: String },

    #[error("Event stream closed while waiting for {expecting}")]
    StreamClosed { expecting: String },

    #[error("Invalid event on line {line}: {error}")]
    InvalidEvent { line: usize, error: String },

    // === Session Errors ===
    #[error("Listener worker failed: {0}")]
    Worker(String),

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create a protocol violation error
    pub fn protocol(id: &NodeId, reason: impl Into<String>) -> Self {
        Self::Protocol {
            id: id.clone(),
            reason: reason.into(),
        }
    }

    /// The callback failure descriptor, if this error came from a listener
    pub fn callback_failure(&self) -> Option<&CallbackFailure> {
        match self {
            Self::Callback { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Listener capability that was being invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Init,
    HandleBegin,
    HandleEnd,
    HandleCancel,
    Terminate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::HandleBegin => write!(f, "handle_begin"),
            Self::HandleEnd => write!(f, "handle_end"),
            Self::HandleCancel => write!(f, "handle_cancel"),
            Self::Terminate => write!(f, "terminate"),
        }
    }
}

/// How a callback failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// The callback returned `Err`
    Error,
    /// The callback panicked
    Panic,
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

/// Error descriptor passed to `terminate` and surfaced to the supervisor
#[derive(Debug, Clone, serde::Serialize)]
pub struct CallbackFailure {
    pub class: FailureClass,
    pub reason: String,
    pub trace: String,
}

impl CallbackFailure {
    /// Create a descriptor, capturing a backtrace at the point of trapping
    pub fn new(class: FailureClass, reason: impl Into<String>) -> Self {
        Self {
            class,
            reason: reason.into(),
            trace: std::backtrace::Backtrace::force_capture().to_string(),
        }
    }
}

impl fmt::Display for CallbackFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.reason)
    }
}

impl std::error::Error for CallbackFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_always_carries_a_trace() {
        let failure = CallbackFailure::new(FailureClass::Error, "x");
        assert_eq!(failure.reason, "x");
        assert!(!failure.trace.is_empty());
        assert_ne!(failure.trace, "disabled backtrace");
        assert_ne!(failure.trace, "unsupported backtrace");
    }

    #[test]
    fn test_callback_failure_accessor() {
        let err = Error::Callback {
            operation: Operation::HandleCancel,
            failure: CallbackFailure::new(FailureClass::Panic, "boom"),
        };
        assert_eq!(err.callback_failure().map(|f| f.class), Some(FailureClass::Panic));
        assert!(err.to_string().contains("handle_cancel"));
        assert!(Error::Worker("gone".into()).callback_failure().is_none());
    }
}
