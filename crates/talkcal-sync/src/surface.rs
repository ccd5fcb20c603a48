//! Text surfaces: the location and description fields of the host editor.
//!
//! Resolution and button logic only see [`TextSurface`]. Each layout
//! variant stores text differently (form value, rich-text nodes, read-only
//! rendering), and the enums here pick the concrete lookup at bind time.
//!
//! Writes imitate a user: focus, key events, the edit, an `input`
//! notification. Hosts that validate or autosave lazily drop programmatic
//! writes that skip those events.

use serde::Serialize;
use tracing::debug;

use talkcal_dom::{Document, EventKind, NodeId, Selector};

use crate::error::SyncError;
use crate::schedule::{Deferred, PageCtx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SurfaceKind {
    Location,
    Description,
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceKind::Location => f.write_str("Location"),
            SurfaceKind::Description => f.write_str("Description"),
        }
    }
}

/// Capability contract shared by every surface binding.
pub trait TextSurface {
    fn kind(&self) -> SurfaceKind;

    /// Current text, `None` when the surface is not on the page.
    fn current_text(&self, doc: &Document) -> Option<String>;

    /// Append `text` on a new line, or set it when the surface is empty.
    ///
    /// Returns [`SyncError::SurfaceReadOnly`] without touching the page when
    /// this viewer cannot edit the surface.
    fn append(&self, page: &mut PageCtx<'_>, text: &str) -> Result<(), SyncError>;

    /// Whether the surface already carries a meeting link or label.
    fn looks_already_populated(&self, doc: &Document, base_url: &str, marker: &str) -> bool {
        self.current_text(doc)
            .is_some_and(|text| text.contains(base_url) || text.contains(marker))
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// The single-line location field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSurface {
    /// `#xLocIn input[jsname=YPqjbf][role=combobox]`, or the read-only
    /// `#xOnCal` rendering when the viewer cannot edit.
    G2 { read_only_fallback: bool },
    /// `<prefix>.location` text input.
    Classic { prefix: String },
}

impl LocationSurface {
    /// The editable input, if this viewer has one.
    pub fn input(&self, doc: &Document) -> Option<NodeId> {
        let input = match self {
            LocationSurface::G2 { .. } => {
                let scope = doc.get_element_by_id("xLocIn")?;
                doc.query_within(
                    scope,
                    &Selector::tag("input")
                        .with_attr("jsname", "YPqjbf")
                        .with_attr("role", "combobox"),
                )?
            }
            LocationSurface::Classic { prefix } => {
                doc.get_element_by_id(&format!("{prefix}.location"))?
            }
        };

        is_writable(doc, input).then_some(input)
    }

    fn read_only_node(&self, doc: &Document) -> Option<NodeId> {
        match self {
            LocationSurface::G2 {
                read_only_fallback: true,
            } => doc.get_element_by_id("xOnCal"),
            _ => None,
        }
    }
}

impl TextSurface for LocationSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Location
    }

    fn current_text(&self, doc: &Document) -> Option<String> {
        if let Some(input) = self.input(doc) {
            return Some(doc.value(input).unwrap_or_default().to_string());
        }
        self.read_only_node(doc).map(|node| doc.text_content(node))
    }

    fn append(&self, page: &mut PageCtx<'_>, text: &str) -> Result<(), SyncError> {
        let input = self
            .input(page.doc)
            .ok_or(SyncError::SurfaceReadOnly(SurfaceKind::Location))?;

        // The host reacts to focus asynchronously; write once it has.
        page.doc.focus(input)?;
        page.timers.schedule(
            page.config.focus_settle,
            Deferred::LocationEdit {
                input,
                text: text.to_string(),
            },
        );
        debug!(%input, "Location write scheduled after focus");
        Ok(())
    }
}

/// Second half of [`LocationSurface::append`], run when the focus timer fires.
pub fn complete_location_edit(
    page: &mut PageCtx<'_>,
    input: NodeId,
    text: &str,
) -> Result<(), SyncError> {
    if !page.doc.is_connected(input) {
        debug!(%input, "Location input gone before write, skipping");
        return Ok(());
    }

    let current = page.doc.value(input).unwrap_or_default().to_string();
    let updated = if current.trim().is_empty() {
        text.to_string()
    } else {
        format!("{current}, {text}")
    };

    page.doc.set_value(input, &updated)?;
    for kind in [EventKind::KeyDown, EventKind::KeyPress, EventKind::Input, EventKind::KeyUp] {
        page.doc.dispatch(input, kind)?;
    }

    if page.config.location_resave_nudge {
        page.timers
            .schedule(page.config.location_nudge_delay, Deferred::LocationNudge { input });
    }
    Ok(())
}

/// Re-touch the location so hosts that ignored the first write persist it.
pub fn nudge_location(page: &mut PageCtx<'_>, input: NodeId) -> Result<(), SyncError> {
    if !page.doc.is_connected(input) {
        return Ok(());
    }

    page.doc.focus(input)?;
    let current = page.doc.value(input).unwrap_or_default().to_string();
    page.doc.set_value(input, &format!("{current} "))?;
    page.doc.dispatch(input, EventKind::Input)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// The multi-line description field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionSurface {
    /// Rich-text `#xDescIn > [role=textbox]`, or read-only `#xDesc > div`.
    G2,
    /// `textarea` inside `<prefix>.descript`.
    Classic { prefix: String },
}

impl DescriptionSurface {
    /// The editable node, if this viewer has one.
    pub fn editable(&self, doc: &Document) -> Option<NodeId> {
        let node = match self {
            DescriptionSurface::G2 => {
                let scope = doc.get_element_by_id("xDescIn")?;
                doc.query_child(scope, &Selector::any().with_attr("role", "textbox"))?
            }
            DescriptionSurface::Classic { prefix } => {
                let scope = doc.get_element_by_id(&format!("{prefix}.descript"))?;
                doc.query_within(scope, &Selector::tag("textarea"))?
            }
        };

        is_writable(doc, node).then_some(node)
    }

    fn read_only_node(&self, doc: &Document) -> Option<NodeId> {
        match self {
            DescriptionSurface::G2 => {
                let scope = doc.get_element_by_id("xDesc")?;
                doc.query_child(scope, &Selector::tag("div"))
            }
            DescriptionSurface::Classic { .. } => None,
        }
    }

    fn read(&self, doc: &Document, node: NodeId) -> String {
        match self {
            DescriptionSurface::G2 => doc.inner_text(node),
            DescriptionSurface::Classic { .. } => doc.value(node).unwrap_or_default().to_string(),
        }
    }
}

impl TextSurface for DescriptionSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Description
    }

    fn current_text(&self, doc: &Document) -> Option<String> {
        self.editable(doc)
            .or_else(|| self.read_only_node(doc))
            .map(|node| self.read(doc, node))
    }

    fn append(&self, page: &mut PageCtx<'_>, text: &str) -> Result<(), SyncError> {
        let node = self
            .editable(page.doc)
            .ok_or(SyncError::SurfaceReadOnly(SurfaceKind::Description))?;
        let has_text = !self.read(page.doc, node).is_empty();

        page.doc.focus(node)?;
        page.doc.dispatch(node, EventKind::KeyDown)?;
        page.doc.dispatch(node, EventKind::KeyPress)?;

        match self {
            DescriptionSurface::G2 => {
                if has_text {
                    append_line_break(page.doc, node)?;
                    append_line_break(page.doc, node)?;
                }
                for (i, line) in split_lines(text).enumerate() {
                    if i > 0 {
                        append_line_break(page.doc, node)?;
                    }
                    if !line.is_empty() {
                        page.doc.append_text(node, line)?;
                    }
                }
            }
            DescriptionSurface::Classic { .. } => {
                let current = self.read(page.doc, node);
                let updated = if has_text {
                    format!("{current}\n\n{text}")
                } else {
                    text.to_string()
                };
                page.doc.set_value(node, &updated)?;
            }
        }

        page.doc.dispatch(node, EventKind::Input)?;
        page.doc.dispatch(node, EventKind::KeyUp)?;
        Ok(())
    }
}

fn append_line_break(doc: &mut Document, node: NodeId) -> Result<(), SyncError> {
    let br = doc.create_element("br");
    doc.append_child(node, br)?;
    Ok(())
}

/// Split on `\r\n`, `\r` or `\n`.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .flat_map(|line| line.split('\r'))
}

fn is_writable(doc: &Document, node: NodeId) -> bool {
    !doc.has_attr(node, "readonly")
        && !doc.has_attr(node, "disabled")
        && doc.attr(node, "contenteditable") != Some("false")
}
