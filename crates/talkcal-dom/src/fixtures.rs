//! Page fixtures mirroring the host calendar's markup closely enough for
//! the engine's selectors: the current ("G2") event editor, the older
//! ("classic") editor and the inline quick-add dialog.

use talkcal_shared::constants::{VIEW_FAMILY_EVENT, VIEW_FAMILY_EVENT_EDIT};

use crate::document::Document;
use crate::error::Result;
use crate::node::{El, NodeId};

/// Options for the G2 full screen editor.
#[derive(Debug, Clone, Default)]
pub struct G2Page {
    /// Editable location value; `None` omits `#xLocIn`.
    pub location: Option<String>,
    /// Read-only location text shown in `#xOnCal` (viewer cannot edit).
    pub read_only_location: Option<String>,
    /// Editable description text; `None` omits `#xDescIn`.
    pub description: Option<String>,
    /// Read-only description text shown in `#xDesc`.
    pub read_only_description: Option<String>,
    /// Render the notifications list (`#xNtList`) readiness anchor.
    pub notifications: bool,
}

impl G2Page {
    /// A fully loaded, editable, empty event.
    pub fn editable() -> Self {
        Self {
            location: Some(String::new()),
            description: Some(String::new()),
            notifications: true,
            ..Default::default()
        }
    }

    pub fn location(mut self, text: impl Into<String>) -> Self {
        self.location = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn read_only(location: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            read_only_location: Some(location.into()),
            read_only_description: Some(description.into()),
            notifications: true,
            ..Default::default()
        }
    }

    /// Switch the document to edit mode and attach the editor under body.
    pub fn render(&self, doc: &mut Document) -> Result<NodeId> {
        let mut editor = El::new("div").class("editor");

        if let Some(location) = &self.location {
            editor = editor.child(
                El::new("div").class("FrSOzf").child(
                    El::new("div").id("xLocIn").child(
                        El::new("input")
                            .attr("jsname", "YPqjbf")
                            .attr("role", "combobox")
                            .value(location.clone()),
                    ),
                ),
            );
        }
        if let Some(location) = &self.read_only_location {
            editor = editor.child(El::new("div").id("xOnCal").text(location.clone()));
        }
        if let Some(description) = &self.description {
            let mut textbox = El::new("div")
                .attr("role", "textbox")
                .attr("contenteditable", "true");
            for (i, line) in description.split('\n').enumerate() {
                if i > 0 {
                    textbox = textbox.child(El::new("br"));
                }
                if !line.is_empty() {
                    textbox = textbox.text(line);
                }
            }
            editor = editor.child(El::new("div").id("xDescIn").child(textbox));
        }
        if let Some(description) = &self.read_only_description {
            editor = editor.child(
                El::new("div")
                    .id("xDesc")
                    .child(El::new("div").text(description.clone())),
            );
        }
        if self.notifications {
            editor = editor.child(
                El::new("div")
                    .class("FrSOzf")
                    .child(El::new("div").id("xNtList")),
            );
        }

        doc.set_view_family(VIEW_FAMILY_EVENT_EDIT);
        let editor = doc.build(editor);
        let body = doc.body();
        doc.append_child(body, editor)?;
        Ok(editor)
    }
}

/// Options for the classic editor, whose ids share a generated prefix
/// such as `:1n`.
#[derive(Debug, Clone)]
pub struct ClassicPage {
    pub prefix: String,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Render the row the action button is placed in.
    pub button_row: bool,
}

impl Default for ClassicPage {
    fn default() -> Self {
        Self {
            prefix: ":1n".to_string(),
            location: Some(String::new()),
            description: Some(String::new()),
            button_row: true,
        }
    }
}

impl ClassicPage {
    pub fn location(mut self, text: impl Into<String>) -> Self {
        self.location = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn render(&self, doc: &mut Document) -> Result<NodeId> {
        let id = |name: &str| format!("{}.{}", self.prefix, name);
        let mut editor = El::new("div")
            .class("ep")
            .child(El::new("label").id(id("location-label")).text("Where"));

        if let Some(location) = &self.location {
            editor = editor.child(El::new("input").id(id("location")).value(location.clone()));
        }
        if let Some(description) = &self.description {
            editor = editor.child(
                El::new("div")
                    .id(id("descript"))
                    .child(El::new("textarea").value(description.clone())),
            );
        }
        if self.button_row {
            editor = editor.child(El::new("div").id(id("rtc")));
        }

        doc.set_view_family(VIEW_FAMILY_EVENT_EDIT);
        let editor = doc.build(editor);
        let body = doc.body();
        doc.append_child(body, editor)?;
        Ok(editor)
    }
}

/// Handles into a rendered quick-add dialog.
#[derive(Debug, Clone, Copy)]
pub struct QuickAddDialog {
    pub wrapper: NodeId,
    pub dialog: NodeId,
    pub tab_event: NodeId,
    /// The host's "more options" button that opens the full editor.
    pub more_options: NodeId,
}

/// Switch to the calendar grid view.
pub fn calendar_view(doc: &mut Document) {
    doc.set_view_family(VIEW_FAMILY_EVENT);
}

/// Pop up the inline create dialog, as the host does after a grid click.
pub fn open_quick_add(doc: &mut Document) -> Result<QuickAddDialog> {
    let wrapper = doc.build(
        El::new("div").class("popup").child(
            El::new("div")
                .attr("role", "dialog")
                .child(
                    El::new("div")
                        .class("tabs")
                        .child(El::new("div").id("tabEvent").text("Event")),
                )
                .child(
                    El::new("div")
                        .attr("role", "button")
                        .attr("jsname", "rhPddf")
                        .text("More options"),
                ),
        ),
    );
    let body = doc.body();
    doc.append_child(body, wrapper)?;

    let dialog = doc.descendants(wrapper)[0];
    let tab_event = doc
        .get_element_by_id("tabEvent")
        .ok_or(crate::DomError::UnknownNode(wrapper))?;
    let more_options = doc
        .query_within(
            dialog,
            &crate::Selector::any()
                .with_attr("role", "button")
                .with_attr("jsname", "rhPddf"),
        )
        .ok_or(crate::DomError::UnknownNode(dialog))?;

    Ok(QuickAddDialog {
        wrapper,
        dialog,
        tab_event,
        more_options,
    })
}
