//! Test Listener - replays hierarchical test-run events to pluggable listeners
//!
//! A producer emits begin/end/cancel events for tests and nested groups,
//! addressed by tree position. A session rebuilds the tree from that flat
//! stream, calls the injected [`Listener`] in tree order, counts outcomes,
//! and finalizes the listener exactly once.

pub mod cli;
pub mod commands;
pub mod common;
pub mod driver;
pub mod event;
pub mod listener;
pub mod session;

// Re-export commonly used types for tests
pub use common::{CallbackFailure, Error, FailureClass, ListenerError, Operation, Result};
pub use driver::Summary;
pub use event::{Event, EventSender, NodeId, NodeKind, TestStatus};
pub use listener::{Listener, SessionOutcome};
pub use session::SessionHandle;
