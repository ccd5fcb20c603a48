//! Observable side effects of a document: mutation records, dispatched
//! synthetic events and opened browsing contexts.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// One queued mutation, delivered in batches by
/// [`Document::take_mutations`](crate::Document::take_mutations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
    /// Attribute name for [`MutationKind::Attributes`].
    pub attribute: Option<String>,
}

impl MutationRecord {
    pub(crate) fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
            attribute: None,
        }
    }

    pub(crate) fn attribute(target: NodeId, name: &str) -> Self {
        Self {
            kind: MutationKind::Attributes,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            attribute: Some(name.to_string()),
        }
    }

    pub(crate) fn character_data(target: NodeId) -> Self {
        Self {
            kind: MutationKind::CharacterData,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            attribute: None,
        }
    }
}

/// Synthetic events a content script can fire at the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Focus,
    KeyDown,
    KeyPress,
    Input,
    KeyUp,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

/// A `window.open` call made by the content script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedWindow {
    pub url: String,
    pub target: String,
}
