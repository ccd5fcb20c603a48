//! The injected action button and its two states.
//!
//! `NoMeeting` renders a create affordance with an inert href. `HasMeeting`
//! renders the join link and is terminal until the container is reset.
//! Rendering only writes what differs from the page, so a repeated pass
//! leaves the document untouched.

use tracing::info;

use talkcal_dom::{Document, NodeId};
use talkcal_shared::constants::JOIN_TARGET;
use talkcal_shared::types::{Branding, ButtonState, MeetingId};

use crate::error::SyncError;

/// Nodes making up one rendered button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonHandles {
    /// `#jitsi_button`; its absence resets the container.
    pub button: NodeId,
    /// Link carrying the label and href.
    pub anchor: NodeId,
    /// Node whose click the engine handles.
    pub click_area: NodeId,
}

impl ButtonHandles {
    pub fn is_connected(&self, doc: &Document) -> bool {
        doc.is_connected(self.button)
    }

    /// Whether a click on `target` lands on this button.
    pub fn hit(&self, doc: &Document, target: NodeId) -> bool {
        doc.contains(self.click_area, target)
    }
}

/// What a click on the button should do in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    AddMeeting,
    Join,
}

#[derive(Debug, Default)]
pub struct ButtonStateMachine {
    state: ButtonState,
}

impl ButtonStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// `NoMeeting -> HasMeeting`. Returns `false` when already there.
    pub fn mark_has_meeting(&mut self) -> bool {
        if self.state == ButtonState::HasMeeting {
            return false;
        }
        self.state = ButtonState::HasMeeting;
        true
    }

    pub fn action(&self) -> ButtonAction {
        match self.state {
            ButtonState::NoMeeting => ButtonAction::AddMeeting,
            ButtonState::HasMeeting => ButtonAction::Join,
        }
    }

    /// Bring the label, href and target in line with the state.
    pub fn render(
        &self,
        doc: &mut Document,
        handles: &ButtonHandles,
        branding: &Branding,
        meeting_id: Option<&MeetingId>,
    ) -> Result<(), SyncError> {
        let anchor = handles.anchor;
        match (self.state, meeting_id) {
            (ButtonState::NoMeeting, _) => {
                write_label(doc, anchor, &branding.add_label())?;
                doc.set_attr(anchor, "href", "#")?;
                doc.remove_attr(anchor, "target")?;
            }
            (ButtonState::HasMeeting, Some(id)) => {
                let url = branding.join_url(id);
                write_label(doc, anchor, &branding.join_label())?;
                if doc.attr(anchor, "href") != Some(url.as_str()) {
                    info!(%url, "Button now joins meeting");
                }
                doc.set_attr(anchor, "href", &url)?;
                doc.set_attr(anchor, "target", JOIN_TARGET)?;
            }
            (ButtonState::HasMeeting, None) => {
                return Err(SyncError::ReadinessNotMet(
                    "join button without a meeting id".into(),
                ));
            }
        }
        Ok(())
    }
}

fn write_label(doc: &mut Document, node: NodeId, label: &str) -> Result<(), SyncError> {
    if doc.text_content(node) != label {
        doc.set_text(node, label)?;
    }
    Ok(())
}
