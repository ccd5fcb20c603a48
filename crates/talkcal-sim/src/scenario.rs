//! JSON scenarios: a scripted host page and user, replayed against the
//! watcher, plus the report printed at the end.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use talkcal_dom::fixtures::{calendar_view, open_quick_add, ClassicPage, G2Page, QuickAddDialog};
use talkcal_dom::{Document, EventKind, NodeId};
use talkcal_shared::constants::{QUICK_ADD_BUTTON_ID, VIEW_FAMILY_KEY};
use talkcal_shared::roomname::RoomUrlGenerator;
use talkcal_shared::types::ButtonState;
use talkcal_sync::{MutationWatcher, SyncConfig, TextSurface, WatcherStats};

use crate::error::SimError;
use crate::http::SimProvisioner;

/// Replayed when no scenario file is configured.
pub const BUILTIN_SCENARIO: &str = r#"{
    "steps": [
        { "step": "open_edit_page", "location": "Room 4", "description": "Quarterly planning" },
        { "step": "click_button" },
        { "step": "advance", "ms": 10 },
        { "step": "click_button" }
    ]
}"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    G2,
    Classic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Show the full screen editor.
    OpenEditPage {
        #[serde(default)]
        layout: Layout,
        #[serde(default)]
        location: String,
        #[serde(default)]
        description: String,
        /// Render the viewer-cannot-edit version (G2 only).
        #[serde(default)]
        read_only: bool,
    },
    /// Back to the calendar grid.
    OpenCalendar,
    /// Pop up the inline create dialog.
    OpenQuickAdd,
    ClickButton,
    /// Click the quick-add button; the host answers by opening the editor.
    ClickQuickAdd,
    /// The user types into the location without any mutation.
    SetLocation { text: String },
    Advance { ms: u64 },
    /// The host drops our button, as when switching events.
    RemoveButton,
    /// Leave the calendar entirely.
    NavigateAway,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Page URL, which may carry the auto-create parameters.
    #[serde(default)]
    pub page_url: Option<String>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn parse(raw: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn load(path: &Path) -> Result<Self, SimError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::parse(&raw)
    }
}

/// End state of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub view: Option<String>,
    pub variant: Option<&'static str>,
    pub button_state: Option<ButtonState>,
    pub button_label: Option<String>,
    pub button_href: Option<String>,
    pub meeting_id: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub opened_windows: Vec<String>,
    pub provisioned: Vec<String>,
    pub stats: WatcherStats,
}

pub struct ScenarioRunner<G> {
    watcher: MutationWatcher<G, SimProvisioner>,
    editor: Option<NodeId>,
    quick_add: Option<QuickAddDialog>,
}

impl<G: RoomUrlGenerator> ScenarioRunner<G> {
    pub fn new(
        scenario: &Scenario,
        config: SyncConfig,
        generator: G,
        provisioner: SimProvisioner,
    ) -> Self {
        let doc = match &scenario.page_url {
            Some(url) => Document::with_url(url.clone()),
            None => Document::new(),
        };
        let mut watcher = MutationWatcher::new(doc, config, generator, provisioner);
        watcher.start();
        Self {
            watcher,
            editor: None,
            quick_add: None,
        }
    }

    pub fn provisioner(&self) -> &SimProvisioner {
        self.watcher.provisioner()
    }

    pub fn run(&mut self, steps: &[Step]) -> Result<(), SimError> {
        for (index, step) in steps.iter().enumerate() {
            debug!(index, ?step, "Replaying step");
            self.apply(index, step)?;
        }
        self.watcher.settle();
        info!(steps = steps.len(), stats = ?self.watcher.stats(), "Scenario finished");
        Ok(())
    }

    fn apply(&mut self, index: usize, step: &Step) -> Result<(), SimError> {
        match step {
            Step::OpenEditPage {
                layout,
                location,
                description,
                read_only,
            } => self.open_editor(*layout, location, description, *read_only)?,
            Step::OpenCalendar => {
                self.close_editor()?;
                calendar_view(self.watcher.document_mut());
            }
            Step::OpenQuickAdd => {
                self.close_quick_add()?;
                self.quick_add = Some(open_quick_add(self.watcher.document_mut())?);
            }
            Step::ClickButton => {
                let target = self
                    .watcher
                    .container()
                    .and_then(|c| c.handles())
                    .map(|h| h.click_area)
                    .ok_or(SimError::MissingTarget {
                        step: index,
                        what: "meeting button",
                    })?;
                self.watcher.click(target);
            }
            Step::ClickQuickAdd => {
                let target = self
                    .watcher
                    .document()
                    .get_element_by_id(QUICK_ADD_BUTTON_ID)
                    .ok_or(SimError::MissingTarget {
                        step: index,
                        what: "quick-add button",
                    })?;
                self.watcher.click(target);
                self.host_follows_more_options()?;
            }
            Step::SetLocation { text } => {
                let input = self
                    .watcher
                    .container()
                    .and_then(|c| c.location().input(self.watcher.document()))
                    .ok_or(SimError::MissingTarget {
                        step: index,
                        what: "location input",
                    })?;
                self.watcher.document_mut().set_value(input, text)?;
            }
            Step::Advance { ms } => self.watcher.advance(Duration::from_millis(*ms)),
            Step::RemoveButton => {
                let button = self
                    .watcher
                    .container()
                    .and_then(|c| c.handles())
                    .map(|h| h.button)
                    .ok_or(SimError::MissingTarget {
                        step: index,
                        what: "meeting button",
                    })?;
                self.watcher.document_mut().remove(button)?;
            }
            Step::NavigateAway => {
                self.close_quick_add()?;
                self.close_editor()?;
                self.watcher.document_mut().remove_dataset(VIEW_FAMILY_KEY);
            }
        }
        self.watcher.run_until_idle();
        Ok(())
    }

    fn open_editor(
        &mut self,
        layout: Layout,
        location: &str,
        description: &str,
        read_only: bool,
    ) -> Result<(), SimError> {
        self.close_quick_add()?;
        self.close_editor()?;
        let doc = self.watcher.document_mut();
        let editor = match (layout, read_only) {
            (Layout::G2, false) => G2Page::editable()
                .location(location)
                .description(description)
                .render(doc)?,
            (Layout::G2, true) => G2Page::read_only(location, description).render(doc)?,
            (Layout::Classic, _) => ClassicPage::default()
                .location(location)
                .description(description)
                .render(doc)?,
        };
        self.editor = Some(editor);
        Ok(())
    }

    /// The host reacts to a "more options" click by swapping the dialog
    /// for an empty editor.
    fn host_follows_more_options(&mut self) -> Result<(), SimError> {
        let clicked = self.quick_add.is_some_and(|dialog| {
            self.watcher
                .document()
                .events_for(dialog.more_options)
                .contains(&EventKind::Click)
        });
        if clicked {
            self.open_editor(Layout::G2, "", "", false)?;
        }
        Ok(())
    }

    fn close_editor(&mut self) -> Result<(), SimError> {
        if let Some(editor) = self.editor.take() {
            self.watcher.document_mut().remove(editor)?;
        }
        Ok(())
    }

    fn close_quick_add(&mut self) -> Result<(), SimError> {
        if let Some(dialog) = self.quick_add.take() {
            self.watcher.document_mut().remove(dialog.wrapper)?;
        }
        Ok(())
    }

    pub fn report(&self) -> Report {
        let doc = self.watcher.document();
        let container = self.watcher.container();
        let handles = container
            .and_then(|c| c.handles())
            .filter(|h| h.is_connected(doc));

        Report {
            view: doc.view_family().map(str::to_string),
            variant: container.map(|c| c.variant().name()),
            button_state: container.map(|c| c.button_state()),
            button_label: handles.map(|h| doc.text_content(h.anchor)),
            button_href: handles.and_then(|h| doc.attr(h.anchor, "href").map(str::to_string)),
            meeting_id: container
                .and_then(|c| c.meeting_id())
                .map(|id| id.to_string()),
            location: container.and_then(|c| c.location().current_text(doc)),
            description: container.and_then(|c| c.description().current_text(doc)),
            opened_windows: doc.opened_windows().iter().map(|w| w.url.clone()).collect(),
            provisioned: self.provisioner().urls(),
            stats: self.watcher.stats(),
        }
    }
}
