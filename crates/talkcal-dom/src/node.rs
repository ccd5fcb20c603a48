//! Node storage and the [`El`] fragment builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Handle to a node in a [`Document`](crate::Document) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    /// Live form value (`input`/`textarea`), distinct from the `value` attribute.
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }
}

/// A detached markup fragment, materialised with
/// [`Document::build`](crate::Document::build).
///
/// Used for injected controls and for test fixtures in place of HTML
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct El {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) value: Option<String>,
    pub(crate) children: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Fragment {
    El(El),
    Text(String),
}

impl El {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Initial form value for `input` and `textarea` elements.
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Fragment::Text(text.into()));
        self
    }

    pub fn child(mut self, child: El) -> Self {
        self.children.push(Fragment::El(child));
        self
    }
}
