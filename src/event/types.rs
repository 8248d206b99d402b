//! Event stream types
//!
//! Wire messages from the test-execution engine, and the payload views
//! handed to listener callbacks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;

use super::id::NodeId;

/// Extra fields passed through from the producer untouched
pub type Extras = Map<String, Value>;

/// Kind of tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Leaf producing exactly one status
    Test,
    /// Internal node with numbered children
    Group,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// A single message from the event source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Node this event refers to
    pub id: NodeId,
    #[serde(flatten)]
    pub phase: Phase,
}

/// What happened to the node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    Begin {
        kind: NodeKind,
        #[serde(default)]
        data: BeginPayload,
    },
    End {
        #[serde(default)]
        data: EndPayload,
    },
    Cancel {
        #[serde(default)]
        reason: String,
    },
}

impl Event {
    pub fn begin(id: impl Into<NodeId>, kind: NodeKind, data: BeginPayload) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Begin { kind, data },
        }
    }

    pub fn end(id: impl Into<NodeId>, data: EndPayload) -> Self {
        Self {
            id: id.into(),
            phase: Phase::End { data },
        }
    }

    pub fn cancel(id: impl Into<NodeId>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phase: Phase::Cancel {
                reason: reason.into(),
            },
        }
    }

    /// Short phase name for logging
    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            Phase::Begin { .. } => "begin",
            Phase::End { .. } => "end",
            Phase::Cancel { .. } => "cancel",
        }
    }
}

/// Fields carried by a begin event
///
/// Groups use `description` plus extras; tests add `source` and `line`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BeginPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source location of the test (module, function)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(flatten)]
    pub extras: Extras,
}

impl BeginPayload {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, line: u32) -> Self {
        self.source = Some(source.into());
        self.line = Some(line);
        self
    }
}

/// Fields carried by an end event
///
/// Test ends carry a `status`; group ends carry `size`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Number of children of a group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Captured output
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,
    #[serde(flatten)]
    pub extras: Extras,
}

impl EndPayload {
    /// End payload for a test with the given status
    pub fn test(status: TestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// End payload for a group with `size` children
    pub fn group(size: usize) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// Outcome of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TestStatus {
    Ok,
    Skipped { reason: String },
    Error { info: String },
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skipped { reason } => write!(f, "skipped ({})", reason),
            Self::Error { info } => write!(f, "error ({})", info),
        }
    }
}

/// Data handed to `handle_begin`
#[derive(Debug, Clone, PartialEq)]
pub struct BeginData {
    pub id: NodeId,
    pub payload: BeginPayload,
}

/// Data handed to `handle_end`
#[derive(Debug, Clone, PartialEq)]
pub struct EndData {
    pub id: NodeId,
    pub payload: EndPayload,
}

impl EndData {
    /// Status of a test end; `None` for groups
    pub fn status(&self) -> Option<&TestStatus> {
        self.payload.status.as_ref()
    }
}

/// Data handed to `handle_cancel`: the node's begin fields plus the reason
///
/// `begin` is empty when the node was cancelled before it began.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelData {
    pub id: NodeId,
    pub begin: BeginPayload,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_test_begin() {
        let event: Event = serde_json::from_value(json!({
            "id": [1, 2],
            "phase": "begin",
            "kind": "test",
            "data": { "description": "adds", "source": "math:add_test", "line": 12 }
        }))
        .unwrap();

        assert_eq!(event.id, NodeId::from([1, 2]));
        match event.phase {
            Phase::Begin { kind, data } => {
                assert_eq!(kind, NodeKind::Test);
                assert_eq!(data.description.as_deref(), Some("adds"));
                assert_eq!(data.line, Some(12));
                assert!(data.extras.is_empty());
            }
            other => panic!("Expected Begin, got {:?}", other),
        }
    }

    #[test]
    fn test_group_begin_keeps_extras() {
        let event: Event = serde_json::from_value(json!({
            "id": [],
            "phase": "begin",
            "kind": "group",
            "data": { "description": "suite", "spawn": "local" }
        }))
        .unwrap();

        match event.phase {
            Phase::Begin { data, .. } => {
                assert_eq!(data.extras.get("spawn"), Some(&json!("local")));
            }
            other => panic!("Expected Begin, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_end_statuses() {
        let end: Event = serde_json::from_value(json!({
            "id": [1],
            "phase": "end",
            "data": { "elapsed_ms": 7, "status": { "result": "skipped", "reason": "slow" } }
        }))
        .unwrap();

        match end.phase {
            Phase::End { data } => {
                assert_eq!(data.elapsed(), Duration::from_millis(7));
                assert_eq!(
                    data.status,
                    Some(TestStatus::Skipped {
                        reason: "slow".to_string()
                    })
                );
            }
            other => panic!("Expected End, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_cancel_without_reason() {
        let event: Event =
            serde_json::from_value(json!({ "id": [3], "phase": "cancel" })).unwrap();
        assert_eq!(event, Event::cancel([3], ""));
        assert_eq!(event.phase_name(), "cancel");
    }

    #[test]
    fn test_unknown_phase_is_rejected() {
        let result: Result<Event, _> =
            serde_json::from_value(json!({ "id": [1], "phase": "finish" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_with_elapsed_saturates() {
        let payload = EndPayload::test(TestStatus::Ok).with_elapsed(Duration::MAX);
        assert_eq!(payload.elapsed_ms, u64::MAX);

        let payload = EndPayload::group(0).with_elapsed(Duration::from_millis(1500));
        assert_eq!(payload.elapsed_ms, 1500);
    }
}
