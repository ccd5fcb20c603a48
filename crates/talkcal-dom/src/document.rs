//! The document arena and every operation the engine performs on it.

use std::collections::BTreeMap;

use tracing::trace;

use talkcal_shared::constants::VIEW_FAMILY_KEY;

use crate::error::{DomError, Result};
use crate::mutation::{DispatchedEvent, EventKind, MutationRecord, OpenedWindow};
use crate::node::{El, ElementData, Fragment, Node, NodeData, NodeId};
use crate::selector::Selector;

/// A live host page.
///
/// Child-list, attribute and character-data changes to connected nodes are
/// queued as [`MutationRecord`]s until [`take_mutations`](Self::take_mutations)
/// hands them out as one batch. Form values are properties, not markup, and
/// do not produce records.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    url: String,
    focused: Option<NodeId>,
    events: Vec<DispatchedEvent>,
    windows: Vec<OpenedWindow>,
    pending: Vec<MutationRecord>,
}

impl Document {
    /// An empty `html > body` page at `about:blank`.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            url: "about:blank".to_string(),
            focused: None,
            events: Vec::new(),
            windows: Vec::new(),
            pending: Vec::new(),
        };
        doc.root = doc.create_element("html");
        doc.body = doc.create_element("body");
        doc.nodes[doc.body.0].parent = Some(doc.root);
        doc.nodes[doc.root.0].children.push(doc.body);
        doc
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.url = url.into();
        doc
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // -----------------------------------------------------------------------
    // Construction and tree edits
    // -----------------------------------------------------------------------

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Element(ElementData {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            value: None,
        }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    /// Materialise a fragment as a detached subtree and return its root.
    pub fn build(&mut self, el: El) -> NodeId {
        let id = self.alloc(NodeData::Element(ElementData {
            tag: el.tag,
            attrs: el.attrs.into_iter().collect(),
            value: el.value,
        }));

        for fragment in el.children {
            let child = match fragment {
                Fragment::El(child) => self.build(child),
                Fragment::Text(text) => self.create_text(text),
            };
            self.nodes[child.0].parent = Some(id);
            self.nodes[id.0].children.push(child);
        }

        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.prepare_insert(parent, child)?;
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        self.record_if_connected(parent, || {
            MutationRecord::child_list(parent, vec![child], Vec::new())
        });
        Ok(())
    }

    /// Insert `child` into `parent` right before `reference`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<()> {
        self.node(reference)?;
        if self.nodes[reference.0].parent != Some(parent) {
            return Err(DomError::Hierarchy(format!(
                "{reference} is not a child of {parent}"
            )));
        }
        self.prepare_insert(parent, child)?;

        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == reference)
            .ok_or_else(|| DomError::Hierarchy(format!("{reference} vanished from {parent}")))?;
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.record_if_connected(parent, || {
            MutationRecord::child_list(parent, vec![child], Vec::new())
        });
        Ok(())
    }

    /// Detach `node` (and its subtree) from its parent.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        self.node(node)?;
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return Ok(());
        };

        self.nodes[parent.0].children.retain(|&c| c != node);
        if self.focused.is_some_and(|f| self.contains(node, f)) {
            self.focused = None;
        }
        self.record_if_connected(parent, || {
            MutationRecord::child_list(parent, Vec::new(), vec![node])
        });
        trace!(%node, %parent, "Removed node");
        Ok(())
    }

    /// Replace all children of `node` with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.element(node)?;
        let removed = std::mem::take(&mut self.nodes[node.0].children);
        for &child in &removed {
            self.nodes[child.0].parent = None;
        }

        let mut added = Vec::new();
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.nodes[text_node.0].parent = Some(node);
            self.nodes[node.0].children.push(text_node);
            added.push(text_node);
        }

        if !added.is_empty() || !removed.is_empty() {
            self.record_if_connected(node, || MutationRecord::child_list(node, added, removed));
        }
        Ok(())
    }

    pub fn append_text(&mut self, node: NodeId, text: &str) -> Result<NodeId> {
        self.element(node)?;
        let text_node = self.create_text(text);
        self.append_child(node, text_node)?;
        Ok(text_node)
    }

    /// Edit the data of an existing text node in place.
    pub fn set_character_data(&mut self, node: NodeId, text: &str) -> Result<()> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(data) => {
                *data = text.to_string();
            }
            NodeData::Element(_) => return Err(DomError::Hierarchy(format!("{node} is not text"))),
        }
        self.record_if_connected(node, || MutationRecord::character_data(node));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Attributes, dataset and form values
    // -----------------------------------------------------------------------

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).ok().map(|el| el.tag.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .ok()
            .and_then(|el| el.attrs.get(name))
            .map(String::as_str)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let el = self.element_mut(node)?;
        if el.attrs.get(name).map(String::as_str) == Some(value) {
            return Ok(());
        }
        el.attrs.insert(name.to_string(), value.to_string());
        self.record_if_connected(node, || MutationRecord::attribute(node, name));
        Ok(())
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Result<()> {
        if self.element_mut(node)?.attrs.remove(name).is_some() {
            self.record_if_connected(node, || MutationRecord::attribute(node, name));
        }
        Ok(())
    }

    /// `document.body.dataset[key]`
    pub fn dataset(&self, key: &str) -> Option<&str> {
        self.attr(self.body, &format!("data-{key}"))
    }

    pub fn set_dataset(&mut self, key: &str, value: &str) {
        let body = self.body;
        // body always exists and is an element
        let _ = self.set_attr(body, &format!("data-{key}"), value);
    }

    pub fn remove_dataset(&mut self, key: &str) {
        let body = self.body;
        let _ = self.remove_attr(body, &format!("data-{key}"));
    }

    /// Host view mode, e.g. `EVENT_EDIT`.
    pub fn view_family(&self) -> Option<&str> {
        self.dataset(VIEW_FAMILY_KEY)
    }

    pub fn set_view_family(&mut self, value: &str) {
        self.set_dataset(VIEW_FAMILY_KEY, value);
    }

    /// Live form value of an `input`/`textarea`, `None` for other nodes.
    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node).ok().and_then(|el| el.value.as_deref())
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.element_mut(node)?.value = Some(value.to_string());
        Ok(())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(n) = self.nodes.get(current.0) else {
                continue;
            };
            if let NodeData::Text(text) = &n.data {
                out.push_str(text);
            }
            stack.extend(n.children.iter().rev().copied());
        }
        out
    }

    /// Rendered text, as `innerText` gives it: `br` becomes a newline and
    /// block children start on their own line.
    pub fn inner_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut break_pending = false;
        for child in self.children(node) {
            self.render_text(*child, &mut out, &mut break_pending);
        }
        out
    }

    fn render_text(&self, node: NodeId, out: &mut String, break_pending: &mut bool) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        match &n.data {
            NodeData::Text(text) => {
                if text.is_empty() {
                    return;
                }
                flush_break(out, break_pending);
                out.push_str(text);
            }
            NodeData::Element(el) if el.tag == "br" => {
                flush_break(out, break_pending);
                out.push('\n');
            }
            NodeData::Element(el) => {
                let block = BLOCK_TAGS.contains(&el.tag.as_str());
                *break_pending |= block;
                for child in &n.children {
                    self.render_text(*child, out, break_pending);
                }
                *break_pending |= block;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Traversal and lookup
    // -----------------------------------------------------------------------

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Descendants of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// `document.getElementById`: connected nodes only, first in document order.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(&Selector::id(id))
    }

    /// First connected element matching `selector`.
    pub fn query(&self, selector: &Selector) -> Option<NodeId> {
        self.query_within(self.root, selector)
    }

    /// First descendant of `scope` matching `selector`.
    pub fn query_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| self.matches(id, selector))
    }

    /// `scope` itself if it matches, otherwise its first matching descendant.
    pub fn query_inclusive(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        if self.matches(scope, selector) {
            Some(scope)
        } else {
            self.query_within(scope, selector)
        }
    }

    /// First direct child of `parent` matching `selector` (`parent > sel`).
    pub fn query_child(&self, parent: NodeId, selector: &Selector) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&id| self.matches(id, selector))
    }

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        self.element(node).is_ok_and(|el| selector.matches(el))
    }

    // -----------------------------------------------------------------------
    // Focus, synthetic events, browsing contexts
    // -----------------------------------------------------------------------

    pub fn focus(&mut self, node: NodeId) -> Result<()> {
        self.element(node)?;
        self.focused = Some(node);
        self.events.push(DispatchedEvent {
            target: node,
            kind: EventKind::Focus,
        });
        Ok(())
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn dispatch(&mut self, node: NodeId, kind: EventKind) -> Result<()> {
        self.node(node)?;
        self.events.push(DispatchedEvent { target: node, kind });
        Ok(())
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    /// Kinds of the events dispatched at `node`, in order.
    pub fn events_for(&self, node: NodeId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == node)
            .map(|e| e.kind)
            .collect()
    }

    pub fn open_window(&mut self, url: &str, target: &str) {
        self.windows.push(OpenedWindow {
            url: url.to_string(),
            target: target.to_string(),
        });
    }

    pub fn opened_windows(&self) -> &[OpenedWindow] {
        &self.windows
    }

    // -----------------------------------------------------------------------
    // Mutation delivery
    // -----------------------------------------------------------------------

    /// Hand out every record queued since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.pending.is_empty()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&ElementData> {
        self.node(id)?.element().ok_or(DomError::NotAnElement(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData> {
        self.node_mut(id)?
            .element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    fn prepare_insert(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.element(parent)?;
        self.node(child)?;
        if child == self.root || self.contains(child, parent) {
            return Err(DomError::Hierarchy(format!(
                "cannot insert {child} into its own subtree"
            )));
        }
        if self.nodes[child.0].parent.is_some() {
            self.remove(child)?;
        }
        Ok(())
    }

    fn record_if_connected(&mut self, target: NodeId, record: impl FnOnce() -> MutationRecord) {
        if self.is_connected(target) {
            self.pending.push(record());
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

const BLOCK_TAGS: &[&str] = &["div", "p", "li", "ul", "ol", "section"];

fn flush_break(out: &mut String, break_pending: &mut bool) {
    if std::mem::take(break_pending) && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;

    #[test]
    fn test_build_and_lookup() {
        let mut doc = Document::new();
        let row = doc.build(
            El::new("div").id("xLocIn").child(
                El::new("input")
                    .attr("jsname", "YPqjbf")
                    .attr("role", "combobox")
                    .value("Room 4"),
            ),
        );

        assert_eq!(doc.get_element_by_id("xLocIn"), None, "detached nodes are invisible");

        let body = doc.body();
        doc.append_child(body, row).unwrap();
        let scope = doc.get_element_by_id("xLocIn").unwrap();
        let input = doc
            .query_within(
                scope,
                &Selector::tag("input").with_attr("role", "combobox"),
            )
            .unwrap();
        assert_eq!(doc.value(input), Some("Room 4"));
        assert_eq!(doc.tag(input), Some("input"));
    }

    #[test]
    fn test_mutations_only_for_connected_targets() {
        let mut doc = Document::new();
        let detached = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(detached, child).unwrap();
        assert!(!doc.has_pending_mutations());

        let body = doc.body();
        doc.append_child(body, detached).unwrap();
        let records = doc.take_mutations();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MutationKind::ChildList);
        assert_eq!(records[0].added, vec![detached]);

        doc.remove(detached).unwrap();
        let records = doc.take_mutations();
        assert_eq!(records[0].removed, vec![detached]);
        assert!(!doc.is_connected(child));
    }

    #[test]
    fn test_attribute_and_value_records() {
        let mut doc = Document::new();
        let input = doc.build(El::new("input"));
        let body = doc.body();
        doc.append_child(body, input).unwrap();
        doc.take_mutations();

        doc.set_value(input, "typed").unwrap();
        assert!(!doc.has_pending_mutations());

        doc.set_view_family("EVENT_EDIT");
        let records = doc.take_mutations();
        assert_eq!(records[0].kind, MutationKind::Attributes);
        assert_eq!(doc.view_family(), Some("EVENT_EDIT"));

        doc.set_view_family("EVENT_EDIT");
        assert!(!doc.has_pending_mutations(), "unchanged attribute is not a mutation");
    }

    #[test]
    fn test_text_content_and_set_text() {
        let mut doc = Document::new();
        let div = doc.build(
            El::new("div")
                .text("Hello ")
                .child(El::new("b").text("there"))
                .child(El::new("br")),
        );
        assert_eq!(doc.text_content(div), "Hello there");

        doc.set_text(div, "replaced").unwrap();
        assert_eq!(doc.text_content(div), "replaced");
        assert_eq!(doc.children(div).len(), 1);
    }

    #[test]
    fn test_inner_text_renders_line_breaks() {
        let mut doc = Document::new();
        let box_ = doc.build(
            El::new("div")
                .text("https://talk.brave.com/room-beta")
                .child(El::new("br"))
                .text("Agenda: planning")
                .child(El::new("br"))
                .child(El::new("br"))
                .child(El::new("div").text("Owner"))
                .child(El::new("div").text("Room 4")),
        );

        assert_eq!(
            doc.inner_text(box_),
            "https://talk.brave.com/room-beta\nAgenda: planning\n\nOwner\nRoom 4"
        );
        assert_eq!(
            doc.text_content(box_),
            "https://talk.brave.com/room-betaAgenda: planningOwnerRoom 4"
        );
    }

    #[test]
    fn test_insert_before_and_cycles() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.build(El::new("div").id("a"));
        let b = doc.build(El::new("div").id("b"));
        doc.append_child(body, a).unwrap();
        doc.insert_before(body, b, a).unwrap();
        assert_eq!(doc.children(body), &[b, a]);

        assert!(doc.append_child(a, body).is_err());
        let stray = doc.create_element("p");
        assert!(doc.insert_before(body, stray, stray).is_err());
    }

    #[test]
    fn test_focus_and_events() {
        let mut doc = Document::new();
        let input = doc.build(El::new("input"));
        doc.focus(input).unwrap();
        doc.dispatch(input, EventKind::Input).unwrap();
        assert_eq!(doc.focused(), Some(input));
        assert_eq!(doc.events_for(input), vec![EventKind::Focus, EventKind::Input]);

        doc.open_window("https://talk.brave.com/x", "_blank");
        assert_eq!(doc.opened_windows()[0].url, "https://talk.brave.com/x");
    }

    #[test]
    fn test_removing_focused_subtree_clears_focus() {
        let mut doc = Document::new();
        let body = doc.body();
        let wrapper = doc.build(El::new("div").child(El::new("input").id("field")));
        doc.append_child(body, wrapper).unwrap();
        let field = doc.get_element_by_id("field").unwrap();
        doc.focus(field).unwrap();

        doc.remove(wrapper).unwrap();
        assert_eq!(doc.focused(), None);
    }
}
