use thiserror::Error;

use crate::node::NodeId;

/// Errors produced by document operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The id does not belong to this document.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// The node is a text node where an element was required.
    #[error("Not an element: {0}")]
    NotAnElement(NodeId),

    /// Inserting the node would create a cycle, or the reference node is
    /// not a child of the parent.
    #[error("Hierarchy request error: {0}")]
    Hierarchy(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DomError>;
