//! One edit-page lifetime: the meeting id, the button and the surfaces of
//! the active layout.
//!
//! A container never outlives its button. Once the rendered button is gone
//! from the page the watcher builds a fresh container, so nothing here needs
//! to be cleared by hand.

use serde::Serialize;
use tracing::{debug, info, warn};

use talkcal_dom::{Document, NodeId};
use talkcal_shared::constants::JOIN_TARGET;
use talkcal_shared::roomname::RoomUrlGenerator;
use talkcal_shared::types::{ButtonState, ContainerId, MeetingId};

use crate::button::{ButtonAction, ButtonHandles, ButtonStateMachine};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::provision::RoomProvisioner;
use crate::resolver::{derive, resolve};
use crate::schedule::{Deferred, PageCtx};
use crate::surface::{DescriptionSurface, LocationSurface, TextSurface};
use crate::variant::LayoutVariant;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reconciled {
    /// Our button is on the page; nothing to do.
    Unchanged,
    /// The button was (re)inserted and rendered in this state.
    Rendered(ButtonState),
}

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClickOutcome {
    /// Not our button.
    Ignored,
    /// Add-meeting flow ran; the button now joins `url`.
    MeetingAdded { url: String },
    /// A join URL was opened in a new browsing context.
    Joined { url: String },
}

#[derive(Debug)]
pub struct EventContainer {
    id: ContainerId,
    variant: LayoutVariant,
    location: LocationSurface,
    description: DescriptionSurface,
    meeting_id: Option<MeetingId>,
    auto_create_requested: bool,
    button: ButtonStateMachine,
    handles: Option<ButtonHandles>,
}

impl EventContainer {
    pub fn new(variant: LayoutVariant, config: &SyncConfig, auto_create_requested: bool) -> Self {
        let id = ContainerId::new();
        debug!(
            container = %id.short(),
            variant = variant.name(),
            auto_create_requested,
            "New event container"
        );
        Self {
            id,
            location: variant.bind_location(config),
            description: variant.bind_description(),
            variant,
            meeting_id: None,
            auto_create_requested,
            button: ButtonStateMachine::new(),
            handles: None,
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn variant(&self) -> &LayoutVariant {
        &self.variant
    }

    pub fn meeting_id(&self) -> Option<&MeetingId> {
        self.meeting_id.as_ref()
    }

    pub fn button_state(&self) -> ButtonState {
        self.button.state()
    }

    pub fn auto_create_requested(&self) -> bool {
        self.auto_create_requested
    }

    pub fn handles(&self) -> Option<&ButtonHandles> {
        self.handles.as_ref()
    }

    pub fn location(&self) -> &LocationSurface {
        &self.location
    }

    pub fn description(&self) -> &DescriptionSurface {
        &self.description
    }

    /// Our rendered button is still on the page.
    pub fn is_button_present(&self, doc: &Document) -> bool {
        self.handles.is_some_and(|h| h.is_connected(doc))
    }

    /// The button was rendered once and has since disappeared.
    pub fn is_stale(&self, doc: &Document) -> bool {
        self.handles.is_some() && !self.is_button_present(doc)
    }

    /// Bring the button in line with the page.
    ///
    /// Surfaces are never written here, except by the add-meeting flow that
    /// an auto-create request schedules.
    pub fn reconcile<G: RoomUrlGenerator + ?Sized>(
        &mut self,
        page: &mut PageCtx<'_>,
        generator: &mut G,
    ) -> Result<Reconciled, SyncError> {
        if self.is_button_present(page.doc) {
            return Ok(Reconciled::Unchanged);
        }
        if !self.variant.is_ready(page.doc) {
            return Err(SyncError::ReadinessNotMet(format!(
                "{} anchors missing",
                self.variant.name()
            )));
        }

        let base_url = page.config.branding.base_url();
        if self.meeting_id.is_none() {
            let resolution = resolve(
                page.doc,
                &self.location,
                &self.description,
                &base_url,
                || generator.generate(),
            );
            let allocated = resolution.is_allocated();
            self.meeting_id = Some(resolution.into_id());

            if allocated && self.auto_create_requested {
                self.auto_create_requested = false;
                page.timers.schedule(
                    page.config.auto_create_delay,
                    Deferred::AutoCreate {
                        container: self.id,
                    },
                );
                info!(container = %self.id.short(), "Automatic add-meeting scheduled");
            }
        }

        let handles = self.variant.ensure_button(page.doc)?;
        self.handles = Some(handles);

        if self.looks_configured(page.doc, &base_url, &page.config.branding.meeting_label())
            && self.button.mark_has_meeting()
        {
            debug!(container = %self.id.short(), "Event already carries a meeting");
        }

        self.button.render(
            page.doc,
            &handles,
            &page.config.branding,
            self.meeting_id.as_ref(),
        )?;
        Ok(Reconciled::Rendered(self.button.state()))
    }

    /// Route a click on `target`.
    pub fn click<P: RoomProvisioner + ?Sized>(
        &mut self,
        page: &mut PageCtx<'_>,
        target: NodeId,
        provisioner: &P,
    ) -> Result<ClickOutcome, SyncError> {
        let handles = match self.handles {
            Some(h) if h.is_connected(page.doc) && h.hit(page.doc, target) => h,
            _ => return Ok(ClickOutcome::Ignored),
        };

        match self.button.action() {
            ButtonAction::AddMeeting => self.add_meeting(page, provisioner),
            ButtonAction::Join => {
                let url = self.join_target(page.doc, &handles, page.config)?;
                page.doc.open_window(&url, JOIN_TARGET);
                info!(%url, "Opening meeting");
                Ok(ClickOutcome::Joined { url })
            }
        }
    }

    /// Timer path for auto-create. Only acts while the button is on the
    /// page and still offers to add a meeting.
    pub fn run_auto_create<P: RoomProvisioner + ?Sized>(
        &mut self,
        page: &mut PageCtx<'_>,
        provisioner: &P,
    ) -> Result<Option<ClickOutcome>, SyncError> {
        if !self.is_button_present(page.doc) || self.button.state() != ButtonState::NoMeeting {
            debug!(container = %self.id.short(), "Auto-create no longer applies");
            return Ok(None);
        }
        self.add_meeting(page, provisioner).map(Some)
    }

    /// Write the invite, flip the button and ask for the room.
    ///
    /// Re-entering it leaves already populated surfaces alone.
    pub fn add_meeting<P: RoomProvisioner + ?Sized>(
        &mut self,
        page: &mut PageCtx<'_>,
        provisioner: &P,
    ) -> Result<ClickOutcome, SyncError> {
        let id = self
            .meeting_id
            .clone()
            .ok_or_else(|| SyncError::ReadinessNotMet("no meeting id resolved".into()))?;
        let branding = page.config.branding.clone();
        let base_url = branding.base_url();
        let marker = branding.meeting_label();
        let url = branding.join_url(&id);

        if self
            .description
            .looks_already_populated(page.doc, &base_url, &marker)
        {
            debug!(container = %self.id.short(), "Description already has an invite");
        } else {
            let invite = page.config.invite.render(&branding, &id, None);
            skip_read_only(self.description.append(page, &invite))?;

            if !self
                .location
                .looks_already_populated(page.doc, &base_url, &marker)
            {
                skip_read_only(self.location.append(page, &branding.location_text(&id)))?;
            }
        }

        let transitioned = self.button.mark_has_meeting();
        if let Some(handles) = self.handles {
            if handles.is_connected(page.doc) {
                self.button.render(page.doc, &handles, &branding, Some(&id))?;
            }
        }

        if transitioned {
            info!(container = %self.id.short(), %url, "Meeting added");
            if let Err(e) = provisioner.create_room(&url) {
                warn!(error = %e, %url, "Room provisioning failed");
            }
        }
        Ok(ClickOutcome::MeetingAdded { url })
    }

    /// URL a join click opens.
    fn join_target(
        &self,
        doc: &Document,
        handles: &ButtonHandles,
        config: &SyncConfig,
    ) -> Result<String, SyncError> {
        let committed = self
            .meeting_id
            .as_ref()
            .ok_or_else(|| SyncError::ReadinessNotMet("join without meeting id".into()))?;

        if self.variant.allows_late_edits() {
            // the user may have edited the location since we rendered
            let base_url = config.branding.base_url();
            let id = derive(doc, &self.location, &self.description, &base_url)
                .map(|(id, _)| id)
                .unwrap_or_else(|| committed.clone());
            return Ok(config.branding.join_url(&id));
        }

        Ok(doc
            .attr(handles.anchor, "href")
            .filter(|href| *href != "#")
            .map(str::to_string)
            .unwrap_or_else(|| config.branding.join_url(committed)))
    }

    fn looks_configured(&self, doc: &Document, base_url: &str, marker: &str) -> bool {
        self.description.looks_already_populated(doc, base_url, marker)
            || self.location.looks_already_populated(doc, base_url, marker)
    }
}

/// Read-only surfaces mean this viewer cannot edit the event; not an error.
fn skip_read_only(result: Result<(), SyncError>) -> Result<(), SyncError> {
    match result {
        Err(SyncError::SurfaceReadOnly(kind)) => {
            debug!(surface = %kind, "Surface is read-only, skipping write");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use talkcal_dom::fixtures::{ClassicPage, G2Page};
    use talkcal_dom::EventKind;

    use crate::provision::{ProvisionError, RecordingProvisioner};
    use crate::schedule::TimerQueue;
    use crate::surface::{complete_location_edit, nudge_location};

    struct Fixed(Vec<&'static str>);

    impl RoomUrlGenerator for Fixed {
        fn generate(&mut self) -> MeetingId {
            MeetingId::new(self.0.remove(0))
        }
    }

    struct Harness {
        doc: Document,
        timers: TimerQueue,
        config: SyncConfig,
    }

    impl Harness {
        fn g2(page: G2Page) -> Self {
            let mut doc = Document::new();
            page.render(&mut doc).unwrap();
            Self {
                doc,
                timers: TimerQueue::new(),
                config: SyncConfig::default(),
            }
        }

        fn page(&mut self) -> PageCtx<'_> {
            PageCtx::new(&mut self.doc, &mut self.timers, &self.config)
        }

        fn flush_location_writes(&mut self) {
            while let Some(task) = self.timers.pop_due(Duration::from_millis(10)) {
                let mut page = PageCtx::new(&mut self.doc, &mut self.timers, &self.config);
                match task {
                    Deferred::LocationEdit { input, text } => {
                        complete_location_edit(&mut page, input, &text).unwrap()
                    }
                    Deferred::LocationNudge { input } => nudge_location(&mut page, input).unwrap(),
                    Deferred::AutoCreate { .. } => {}
                }
            }
        }
    }

    #[test]
    fn test_reconcile_fresh_event() {
        let mut h = Harness::g2(G2Page::editable());
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        let mut gen = Fixed(vec!["QuietOttersGatherSoftly"]);

        let outcome = container.reconcile(&mut h.page(), &mut gen).unwrap();
        assert_eq!(outcome, Reconciled::Rendered(ButtonState::NoMeeting));
        assert_eq!(
            container.meeting_id(),
            Some(&MeetingId::new("QuietOttersGatherSoftly"))
        );
        assert!(h.timers.is_empty());

        // second pass sees the button and does nothing
        let outcome = container.reconcile(&mut h.page(), &mut gen).unwrap();
        assert_eq!(outcome, Reconciled::Unchanged);
    }

    #[test]
    fn test_reconcile_existing_meeting() {
        let mut h = Harness::g2(
            G2Page::editable().location("Brave Talk Meeting - https://talk.brave.com/room-alpha"),
        );
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, true);
        let mut gen = Fixed(vec![]);

        let outcome = container.reconcile(&mut h.page(), &mut gen).unwrap();
        assert_eq!(outcome, Reconciled::Rendered(ButtonState::HasMeeting));
        let anchor = container.handles().unwrap().anchor;
        assert_eq!(
            h.doc.attr(anchor, "href"),
            Some("https://talk.brave.com/room-alpha")
        );
        // derived ids never trigger auto-create
        assert!(h.timers.is_empty());
        assert!(container.auto_create_requested());
    }

    #[test]
    fn test_not_ready_fails_without_touching_page() {
        let mut h = Harness::g2(G2Page {
            notifications: false,
            ..G2Page::editable()
        });
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        let mut gen = Fixed(vec![]);

        let result = container.reconcile(&mut h.page(), &mut gen);
        assert!(matches!(result, Err(SyncError::ReadinessNotMet(_))));
        assert!(container.meeting_id().is_none());
        assert!(h.doc.get_element_by_id("jitsi_button").is_none());
    }

    #[test]
    fn test_add_meeting_click() {
        let mut h = Harness::g2(G2Page::editable().location("Room 4"));
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        let mut gen = Fixed(vec!["room-new"]);
        let provisioner = RecordingProvisioner::new();
        container.reconcile(&mut h.page(), &mut gen).unwrap();
        let area = container.handles().unwrap().click_area;

        let outcome = container.click(&mut h.page(), area, &provisioner).unwrap();
        h.flush_location_writes();

        assert_eq!(
            outcome,
            ClickOutcome::MeetingAdded {
                url: "https://talk.brave.com/room-new".into()
            }
        );
        assert_eq!(container.button_state(), ButtonState::HasMeeting);
        assert_eq!(
            container.location().current_text(&h.doc).as_deref(),
            Some("Room 4, Brave Talk Meeting - https://talk.brave.com/room-new")
        );
        assert!(container
            .description()
            .current_text(&h.doc)
            .unwrap()
            .contains("https://talk.brave.com/room-new"));
        assert_eq!(provisioner.urls(), vec!["https://talk.brave.com/room-new"]);

        // second click joins instead of adding again
        let outcome = container.click(&mut h.page(), area, &provisioner).unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::Joined {
                url: "https://talk.brave.com/room-new".into()
            }
        );
        assert_eq!(provisioner.urls().len(), 1);
    }

    #[test]
    fn test_join_rereads_late_location_edit() {
        let mut h = Harness::g2(
            G2Page::editable().location("https://talk.brave.com/first"),
        );
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        container.reconcile(&mut h.page(), &mut Fixed(vec![])).unwrap();

        let input = container.location().input(&h.doc).unwrap();
        h.doc.set_value(input, "https://talk.brave.com/second").unwrap();
        let area = container.handles().unwrap().click_area;
        let outcome = container
            .click(&mut h.page(), area, &RecordingProvisioner::new())
            .unwrap();

        assert_eq!(
            outcome,
            ClickOutcome::Joined {
                url: "https://talk.brave.com/second".into()
            }
        );
        assert_eq!(h.doc.opened_windows()[0].target, "_blank");
        // the committed id stays put
        assert_eq!(container.meeting_id(), Some(&MeetingId::new("first")));
    }

    #[test]
    fn test_classic_join_uses_rendered_href() {
        let mut doc = Document::new();
        ClassicPage::default()
            .location("https://talk.brave.com/classic-room")
            .render(&mut doc)
            .unwrap();
        let mut timers = TimerQueue::new();
        let config = SyncConfig::default();
        let variant = LayoutVariant::detect(&doc).unwrap();
        let mut container = EventContainer::new(variant, &config, false);
        let mut page = PageCtx::new(&mut doc, &mut timers, &config);

        container.reconcile(&mut page, &mut Fixed(vec![])).unwrap();
        let input = page.doc.get_element_by_id(":1n.location").unwrap();
        page.doc.set_value(input, "https://talk.brave.com/edited").unwrap();

        let button = container.handles().unwrap().button;
        let outcome = container
            .click(&mut page, button, &RecordingProvisioner::new())
            .unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::Joined {
                url: "https://talk.brave.com/classic-room".into()
            }
        );
    }

    #[test]
    fn test_populated_description_skips_invite() {
        let mut h = Harness::g2(
            G2Page::editable().description("Join https://talk.brave.com/"),
        );
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        let mut gen = Fixed(vec!["fresh"]);
        container.reconcile(&mut h.page(), &mut gen).unwrap();
        let before = container.description().current_text(&h.doc);

        container
            .add_meeting(&mut h.page(), &RecordingProvisioner::new())
            .unwrap();
        h.flush_location_writes();

        assert_eq!(container.description().current_text(&h.doc), before);
        assert_eq!(container.location().current_text(&h.doc).as_deref(), Some(""));
    }

    #[test]
    fn test_provision_failure_still_shows_join() {
        let mut h = Harness::g2(G2Page::editable());
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        container
            .reconcile(&mut h.page(), &mut Fixed(vec!["room-x"]))
            .unwrap();
        let provisioner = RecordingProvisioner::failing(ProvisionError::Unavailable);

        let area = container.handles().unwrap().click_area;
        container.click(&mut h.page(), area, &provisioner).unwrap();

        let anchor = container.handles().unwrap().anchor;
        assert_eq!(
            h.doc.attr(anchor, "href"),
            Some("https://talk.brave.com/room-x")
        );
    }

    #[test]
    fn test_read_only_event_never_written() {
        let mut h = Harness::g2(G2Page::read_only("", ""));
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        container
            .reconcile(&mut h.page(), &mut Fixed(vec!["ro"]))
            .unwrap();

        container
            .add_meeting(&mut h.page(), &RecordingProvisioner::new())
            .unwrap();
        assert!(h.timers.is_empty());
        assert!(h
            .doc
            .events()
            .iter()
            .all(|e| e.kind != EventKind::Input));
        assert_eq!(container.button_state(), ButtonState::HasMeeting);
    }

    #[test]
    fn test_click_elsewhere_ignored() {
        let mut h = Harness::g2(G2Page::editable());
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        container
            .reconcile(&mut h.page(), &mut Fixed(vec!["x"]))
            .unwrap();

        let body = h.doc.body();
        let outcome = container
            .click(&mut h.page(), body, &RecordingProvisioner::new())
            .unwrap();
        assert_eq!(outcome, ClickOutcome::Ignored);
        assert_eq!(container.button_state(), ButtonState::NoMeeting);
    }

    #[test]
    fn test_stale_after_button_removed() {
        let mut h = Harness::g2(G2Page::editable());
        let mut container = EventContainer::new(LayoutVariant::G2, &h.config, false);
        assert!(!container.is_stale(&h.doc));
        container
            .reconcile(&mut h.page(), &mut Fixed(vec!["x"]))
            .unwrap();

        let button = container.handles().unwrap().button;
        h.doc.remove(button).unwrap();
        assert!(container.is_stale(&h.doc));
    }
}
