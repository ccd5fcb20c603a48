//! Affordance in the inline quick-add dialog (calendar grid view).
//!
//! No meeting logic runs here. The button only asks for an automatic
//! add-meeting flow and pushes the host into its full screen editor, where
//! the container takes over.

use tracing::debug;

use talkcal_dom::{Document, El, EventKind, NodeId, Selector};
use talkcal_shared::constants::{QUICK_ADD_BUTTON_ID, QUICK_ADD_CONTENT_ID};
use talkcal_shared::types::Branding;

use crate::error::SyncError;

fn dialog_selector() -> Selector {
    Selector::any().with_attr("role", "dialog")
}

/// The host's "more options" button, which opens the full editor.
fn more_options_selector() -> Selector {
    Selector::tag("div")
        .with_attr("role", "button")
        .with_attr("jsname", "rhPddf")
}

/// Inject the button into a dialog among `added`, if one carries the
/// event tab and the button is not on the page yet.
pub fn inject(
    doc: &mut Document,
    added: &[NodeId],
    branding: &Branding,
) -> Result<Option<NodeId>, SyncError> {
    for &node in added {
        if doc.get_element_by_id(QUICK_ADD_BUTTON_ID).is_some() {
            return Ok(None);
        }
        if !doc.is_connected(node) {
            continue;
        }
        let Some(dialog) = doc.query_inclusive(node, &dialog_selector()) else {
            continue;
        };
        let Some(tab_row) = doc
            .query_within(dialog, &Selector::id("tabEvent"))
            .and_then(|tab| doc.parent(tab))
        else {
            continue;
        };

        let content = doc.build(
            El::new("content")
                .attr("role", "tabpanel")
                .id(QUICK_ADD_CONTENT_ID)
                .child(
                    El::new("div")
                        .class("fy8IH poWrGb")
                        .child(El::new("div").class("FkXdCf HyA7Fb")),
                )
                .child(
                    El::new("div").class("mH89We").child(
                        El::new("div")
                            .attr("role", "button")
                            .class("uArJ5e UQuaGc Y5sE8d")
                            .id(QUICK_ADD_BUTTON_ID)
                            .child(
                                El::new("content")
                                    .class("CwaK9")
                                    .child(El::new("span").text(branding.add_label())),
                            ),
                    ),
                ),
        );
        doc.append_child(tab_row, content)?;
        debug!(%dialog, "Quick-add button injected");
        return Ok(doc.get_element_by_id(QUICK_ADD_BUTTON_ID));
    }
    Ok(None)
}

/// Whether a click on `target` lands on the quick-add button.
pub fn is_quick_add_click(doc: &Document, target: NodeId) -> bool {
    doc.get_element_by_id(QUICK_ADD_BUTTON_ID)
        .is_some_and(|button| doc.contains(button, target))
}

/// Click the host's "more options" button. Returns `false` when the dialog
/// has already gone.
pub fn open_full_editor(doc: &mut Document) -> Result<bool, SyncError> {
    let Some(more) = doc.query(&more_options_selector()) else {
        debug!("More options button not found, quick-add dialog gone");
        return Ok(false);
    };
    doc.dispatch(more, EventKind::Click)?;
    Ok(true)
}
