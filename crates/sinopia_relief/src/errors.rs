//! Tree operation errors.

use thiserror::Error;

/// Error raised by a structural tree operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The reference node is not a child of the target parent.
    #[error("the reference node is not a child of this node")]
    NotAChild,
    /// The operation only applies to text nodes.
    #[error("the node is not a text node")]
    NotText,
    /// The node has no parent to operate through.
    #[error("the node is not attached to a parent")]
    Detached,
    /// Inserting the node would make it its own ancestor, or the parent cannot hold children.
    #[error("the node cannot be inserted at this position")]
    HierarchyRequest,
}
