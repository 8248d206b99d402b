//! Tree position identifiers
//!
//! A node id is the path of 1-based child indices from the root. The root
//! is the empty path; child `n` of `[1, 2]` is `[1, 2, n]`.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Position of a node in the test tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Vec<u32>);

impl NodeId {
    /// The root id (empty sequence)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Id of the `n`th child (1-based) of this node
    pub fn child(&self, n: u32) -> Self {
        debug_assert!(n >= 1, "child indices start at 1");
        let mut path = Vec::with_capacity(self.0.len() + 1);
        path.extend_from_slice(&self.0);
        path.push(n);
        Self(path)
    }

    /// Id of the parent node, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        self.0.split_last().map(|(_, init)| Self(init.to_vec()))
    }

    /// True if `self` is a strict ancestor of `other`
    pub fn is_ancestor_of(&self, other: &NodeId) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of steps from the root
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Index of this node among its siblings, `None` for the root
    pub fn index(&self) -> Option<u32> {
        self.0.last().copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

// Lets sets of ids be probed with a path prefix without allocating
impl Borrow<[u32]> for NodeId {
    fn borrow(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for NodeId {
    fn from(path: Vec<u32>) -> Self {
        Self(path)
    }
}

impl From<&[u32]> for NodeId {
    fn from(path: &[u32]) -> Self {
        Self(path.to_vec())
    }
}

impl<const N: usize> From<[u32; N]> for NodeId {
    fn from(path: [u32; N]) -> Self {
        Self(path.to_vec())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, n) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", n)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_and_parent() {
        let root = NodeId::root();
        let id = root.child(1).child(3);
        assert_eq!(id, NodeId::from([1, 3]));
        assert_eq!(id.parent(), Some(NodeId::from([1])));
        assert_eq!(id.parent().and_then(|p| p.parent()), Some(root.clone()));
        assert_eq!(root.parent(), None);
    }

    #[test]
    fn test_is_ancestor_is_strict() {
        let a = NodeId::from([1]);
        let b = NodeId::from([1, 2, 4]);
        assert!(a.is_ancestor_of(&b));
        assert!(NodeId::root().is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(!b.is_ancestor_of(&a));
        assert!(!NodeId::from([2]).is_ancestor_of(&b));
        assert!(!NodeId::from([1, 2, 4]).is_ancestor_of(&NodeId::from([1, 2])));
    }

    #[test]
    fn test_index_and_depth() {
        let id = NodeId::from([2, 5]);
        assert_eq!(id.index(), Some(5));
        assert_eq!(id.depth(), 2);
        assert_eq!(NodeId::root().index(), None);
        assert!(NodeId::root().is_root());
    }

    #[test]
    fn test_display() {
        assert_eq!(NodeId::root().to_string(), "[]");
        assert_eq!(NodeId::from([1, 2, 3]).to_string(), "[1,2,3]");
    }

    #[test]
    fn test_serde_is_plain_array() {
        let id: NodeId = serde_json::from_str("[1,2]").unwrap();
        assert_eq!(id, NodeId::from([1, 2]));
        assert_eq!(serde_json::to_string(&NodeId::root()).unwrap(), "[]");
    }
}
