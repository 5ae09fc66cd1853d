//! Structural node paths.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::node::Node;

/// Child indices from a root down to a node. The empty path is the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(SmallVec<[u32; 8]>);

impl NodePath {
    /// The path of the root itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        Self(indices.into_iter().collect())
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Compute the path of `node` relative to `root` by walking parents upward.
    ///
    /// Returns `None` when `node` is not inside `root`.
    pub fn of(node: &Node, root: &Node) -> Option<Self> {
        let mut indices: SmallVec<[u32; 8]> = SmallVec::new();
        let mut current = node.clone();

        while !current.ptr_eq(root) {
            let index = current.index_in_parent()?;
            indices.push(index as u32);
            current = current.parent()?;
        }

        indices.reverse();
        Some(Self(indices))
    }

    /// Follow the child indices from `root`.
    pub fn resolve(&self, root: &Node) -> Option<Node> {
        let mut current = root.clone();
        for &index in self.0.iter() {
            current = current.child_at(index as usize)?;
        }
        Some(current)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}
