//! Hierarchical test-run events
//!
//! Nodes are addressed by [`NodeId`] paths; the producer emits begin, end
//! and cancel events for each node in any interleaving that respects
//! begin-before-end per node.

mod id;
mod sender;
mod types;

pub use id::NodeId;
pub use sender::EventSender;
pub use types::*;
