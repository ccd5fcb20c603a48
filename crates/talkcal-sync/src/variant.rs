//! Concrete page layouts the engine knows how to drive.
//!
//! A variant is picked once per container at classification time and
//! decides which surfaces to bind, when the page counts as loaded and where
//! the action button goes. Adding a layout means adding an arm here; the
//! resolver and the button logic stay untouched.

use tracing::debug;

use talkcal_dom::{Document, El, Selector};
use talkcal_shared::constants::{BUTTON_CONTAINER_ID, BUTTON_ID};

use crate::button::ButtonHandles;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::surface::{DescriptionSurface, LocationSurface};

/// Marks the row we insert into the G2 editor so stale copies can be found.
const ROW_MARKER: (&str, &str) = ("data-talkcal", "row");

const G2_NOTIFICATIONS: &str = "xNtList";
const G2_SURFACE_MARKERS: [&str; 4] = ["xLocIn", "xOnCal", "xDescIn", "xDesc"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutVariant {
    /// Current full screen editor.
    G2,
    /// Older editor whose element ids share a generated prefix.
    Classic { prefix: String },
}

impl LayoutVariant {
    /// Which layout the page shows, if any we know.
    pub fn detect(doc: &Document) -> Option<Self> {
        let g2 = std::iter::once(G2_NOTIFICATIONS)
            .chain(G2_SURFACE_MARKERS)
            .any(|id| doc.get_element_by_id(id).is_some());
        if g2 {
            return Some(Self::G2);
        }

        let label = doc.query(&Selector::id_contains("location-label"))?;
        let id = doc.attr(label, "id")?;
        let prefix = id.split('.').next().unwrap_or_default();
        Some(Self::Classic {
            prefix: prefix.to_string(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::G2 => "g2",
            Self::Classic { .. } => "classic",
        }
    }

    /// Necessary (not sufficient) conditions for acting on the page.
    pub fn is_ready(&self, doc: &Document) -> bool {
        match self {
            Self::G2 => {
                doc.get_element_by_id(G2_NOTIFICATIONS).is_some()
                    && G2_SURFACE_MARKERS
                        .iter()
                        .any(|id| doc.get_element_by_id(id).is_some())
            }
            Self::Classic { prefix } => {
                doc.query(&Selector::id_contains("location-label")).is_some()
                    && (doc.get_element_by_id(&format!("{prefix}.location")).is_some()
                        || doc.get_element_by_id(&format!("{prefix}.descript")).is_some())
            }
        }
    }

    pub fn bind_location(&self, config: &SyncConfig) -> LocationSurface {
        match self {
            Self::G2 => LocationSurface::G2 {
                read_only_fallback: config.read_only_location_fallback,
            },
            Self::Classic { prefix } => LocationSurface::Classic {
                prefix: prefix.clone(),
            },
        }
    }

    pub fn bind_description(&self) -> DescriptionSurface {
        match self {
            Self::G2 => DescriptionSurface::G2,
            Self::Classic { prefix } => DescriptionSurface::Classic {
                prefix: prefix.clone(),
            },
        }
    }

    /// Whether the user can still change the location after the button is
    /// rendered, so a join click must re-read it.
    pub fn allows_late_edits(&self) -> bool {
        matches!(self, Self::G2)
    }

    /// The button already on the page, if any.
    pub fn find_button(&self, doc: &Document) -> Option<ButtonHandles> {
        let button = doc.get_element_by_id(BUTTON_ID)?;
        let anchor = doc
            .query_within(button, &Selector::tag("a"))
            .unwrap_or(button);
        let click_area = match self {
            Self::G2 => doc.get_element_by_id(BUTTON_CONTAINER_ID).unwrap_or(button),
            Self::Classic { .. } => button,
        };
        Some(ButtonHandles {
            button,
            anchor,
            click_area,
        })
    }

    /// Return the button, inserting it first when missing.
    ///
    /// Fails with [`SyncError::MissingAnchor`] when the node it attaches to
    /// is not on the page; the caller then shows nothing.
    pub fn ensure_button(&self, doc: &mut Document) -> Result<ButtonHandles, SyncError> {
        if let Some(handles) = self.find_button(doc) {
            return Ok(handles);
        }

        match self {
            Self::G2 => insert_g2_row(doc)?,
            Self::Classic { prefix } => insert_classic_button(doc, prefix)?,
        }
        self.find_button(doc)
            .ok_or(SyncError::MissingAnchor("inserted button"))
    }
}

/// New row right before the notifications row.
fn insert_g2_row(doc: &mut Document) -> Result<(), SyncError> {
    let neighbor = doc
        .get_element_by_id(G2_NOTIFICATIONS)
        .and_then(|list| doc.parent(list))
        .ok_or(SyncError::MissingAnchor("notifications row"))?;
    let parent = doc
        .parent(neighbor)
        .ok_or(SyncError::MissingAnchor("editor column"))?;

    let marker = Selector::any().with_attr(ROW_MARKER.0, ROW_MARKER.1);
    while let Some(stale) = doc.query(&marker) {
        debug!(%stale, "Removing stale button row");
        doc.remove(stale)?;
    }

    let row = doc.build(
        El::new("div")
            .class("FrSOzf")
            .attr(ROW_MARKER.0, ROW_MARKER.1)
            .child(El::new("div").class("tzcF6").child(El::new("div").class("DPvwYc")))
            .child(
                El::new("div").class("j3nyw").child(
                    El::new("div").class("BY5aAd").child(
                        El::new("div")
                            .attr("role", "button")
                            .class("uArJ5e UQuaGc Y5sE8d")
                            .id(BUTTON_CONTAINER_ID)
                            .child(
                                El::new("content").class("CwaK9").child(
                                    El::new("div")
                                        .id(BUTTON_ID)
                                        .class("goog-inline-block jfk-button jfk-button-action")
                                        .child(El::new("a").attr("href", "#")),
                                ),
                            ),
                    ),
                ),
            ),
    );
    doc.insert_before(parent, row, neighbor)?;
    Ok(())
}

/// Button inside the `<prefix>.rtc` row.
fn insert_classic_button(doc: &mut Document, prefix: &str) -> Result<(), SyncError> {
    let row = doc
        .get_element_by_id(&format!("{prefix}.rtc"))
        .ok_or(SyncError::MissingAnchor("classic button row"))?;
    doc.set_attr(row, "class", "button_container")?;

    let button = doc.build(
        El::new("div")
            .id(BUTTON_ID)
            .class("goog-inline-block jfk-button jfk-button-action")
            .child(El::new("a").attr("href", "#")),
    );
    doc.append_child(row, button)?;
    Ok(())
}
