//! Common utilities shared between the library and the replay CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{CallbackFailure, Error, FailureClass, ListenerError, Operation, Result};
