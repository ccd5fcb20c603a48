//! The reactive driver.
//!
//! Mutation observer callbacks are modelled as an explicit FIFO of
//! [`PageEvent`]s. Child-list records produced while one event is handled
//! are delivered as a later batch, as a browser delivers observer records
//! after the current task. Every handler is idempotent and swallows its
//! errors after logging them: an error escaping an observer callback would
//! stop observation for the rest of the page's life.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use talkcal_dom::{Document, EventKind, MutationKind, MutationRecord, NodeId};
use talkcal_shared::roomname::RoomUrlGenerator;

use crate::classifier::{classify, PageState};
use crate::config::SyncConfig;
use crate::container::{ClickOutcome, EventContainer, Reconciled};
use crate::error::SyncError;
use crate::provision::RoomProvisioner;
use crate::quick_add;
use crate::schedule::{Deferred, PageCtx, TimerQueue};
use crate::signal::AutoCreateSignal;
use crate::surface::{complete_location_edit, nudge_location};

/// Upper bound on events handled by one drain, in case the host and the
/// engine keep re-triggering each other.
const MAX_EVENTS_PER_DRAIN: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// One batch of child-list records.
    Mutations(Vec<MutationRecord>),
    /// The user clicked `target`.
    Click(NodeId),
    /// A deferred task came due.
    Timer(Deferred),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WatcherStats {
    /// Mutation batches handled.
    pub passes: u64,
    /// Passes that did nothing because the page was not ready.
    pub skipped: u64,
    pub containers_created: u64,
    /// Errors logged and swallowed.
    pub errors: u64,
}

pub struct MutationWatcher<G, P> {
    doc: Document,
    config: SyncConfig,
    timers: TimerQueue,
    queue: VecDeque<PageEvent>,
    container: Option<EventContainer>,
    /// Auto-create request waiting for the next container.
    pending_auto_create: bool,
    observing: bool,
    generator: G,
    provisioner: P,
    stats: WatcherStats,
}

impl<G: RoomUrlGenerator, P: RoomProvisioner> MutationWatcher<G, P> {
    pub fn new(doc: Document, config: SyncConfig, generator: G, provisioner: P) -> Self {
        let signal = AutoCreateSignal::from_page_url(doc.url(), &config.extension_id);
        if signal.is_requested() {
            info!("Auto-create requested by page URL");
        }
        Self {
            doc,
            config,
            timers: TimerQueue::new(),
            queue: VecDeque::new(),
            container: None,
            pending_auto_create: signal.is_requested(),
            observing: false,
            generator,
            provisioner,
            stats: WatcherStats::default(),
        }
    }

    /// Subscribe to the body and run the startup pass.
    ///
    /// Mutations from before the subscription are never delivered.
    pub fn start(&mut self) {
        if self.observing {
            return;
        }
        self.doc.take_mutations();
        self.observing = true;
        info!(view = ?self.doc.view_family(), "Watching page");

        let state = classify(&self.doc);
        if state.is_edit_mode() {
            self.maintain_edit_page(state);
        }
        self.run_until_idle();
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Host-side access to the page. Changes made here reach the watcher on
    /// the next [`run_until_idle`](Self::run_until_idle).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn container(&self) -> Option<&EventContainer> {
        self.container.as_ref()
    }

    pub fn stats(&self) -> WatcherStats {
        self.stats
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    pub fn pending_auto_create(&self) -> bool {
        self.pending_auto_create
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Simulate a user click on `target` and process everything it causes.
    pub fn click(&mut self, target: NodeId) {
        self.run_until_idle();
        self.queue.push_back(PageEvent::Click(target));
        self.run_until_idle();
    }

    /// Handle queued events and mutation batches until neither is left.
    pub fn run_until_idle(&mut self) {
        let mut handled = 0;
        while let Some(event) = self.next_event() {
            handled += 1;
            if handled > MAX_EVENTS_PER_DRAIN {
                warn!(handled, "Event queue did not settle, dropping the rest");
                self.queue.clear();
                self.doc.take_mutations();
                break;
            }
            self.handle(event);
        }
    }

    /// Move the virtual clock forward by `by`, firing due timers in order.
    pub fn advance(&mut self, by: Duration) {
        let deadline = self.timers.now() + by;
        self.run_until_idle();
        while let Some(task) = self.timers.pop_due(deadline) {
            self.queue.push_back(PageEvent::Timer(task));
            self.run_until_idle();
        }
        self.timers.set_now(deadline);
    }

    /// Advance until no timer is pending.
    pub fn settle(&mut self) {
        self.run_until_idle();
        while let Some(due) = self.timers.next_due() {
            let by = due.saturating_sub(self.timers.now());
            self.advance(by);
        }
    }

    fn next_event(&mut self) -> Option<PageEvent> {
        if self.observing {
            let batch: Vec<MutationRecord> = self
                .doc
                .take_mutations()
                .into_iter()
                .filter(|m| m.kind == MutationKind::ChildList)
                .collect();
            if !batch.is_empty() {
                return Some(PageEvent::Mutations(batch));
            }
        }
        self.queue.pop_front()
    }

    fn handle(&mut self, event: PageEvent) {
        trace!(?event, "Handling page event");
        match event {
            PageEvent::Mutations(batch) => self.on_mutations(&batch),
            PageEvent::Click(target) => self.on_click(target),
            PageEvent::Timer(task) => self.on_timer(task),
        }
    }

    fn on_mutations(&mut self, batch: &[MutationRecord]) {
        self.stats.passes += 1;
        let state = classify(&self.doc);

        if state.is_quick_add_mode() {
            let added: Vec<NodeId> = batch.iter().flat_map(|m| m.added.iter().copied()).collect();
            if let Err(e) = quick_add::inject(&mut self.doc, &added, &self.config.branding) {
                self.log_error(&e);
            }
        } else if state.is_edit_mode() {
            self.maintain_edit_page(state);
        }
    }

    /// Mode B: make sure the live container has its button.
    fn maintain_edit_page(&mut self, state: PageState) {
        let Some(variant) = state.variant.filter(|_| state.ready) else {
            self.stats.skipped += 1;
            debug!("Edit page not ready yet");
            return;
        };

        let needs_new = match &self.container {
            None => true,
            Some(c) => c.is_stale(&self.doc) || c.variant() != &variant,
        };
        if needs_new {
            let auto_create = std::mem::take(&mut self.pending_auto_create);
            self.container = Some(EventContainer::new(variant, &self.config, auto_create));
            self.stats.containers_created += 1;
        }

        let Some(container) = self.container.as_mut() else {
            return;
        };
        let mut page = PageCtx::new(&mut self.doc, &mut self.timers, &self.config);
        match container.reconcile(&mut page, &mut self.generator) {
            Ok(Reconciled::Unchanged) => {}
            Ok(Reconciled::Rendered(button)) => {
                info!(
                    container = %container.id().short(),
                    meeting = ?container.meeting_id().map(|id| id.as_str()),
                    ?button,
                    "Button rendered"
                );
            }
            Err(e) => self.log_error(&e),
        }
    }

    fn on_click(&mut self, target: NodeId) {
        if let Err(e) = self.doc.dispatch(target, EventKind::Click) {
            self.log_error(&e.into());
            return;
        }

        if quick_add::is_quick_add_click(&self.doc, target) {
            self.pending_auto_create = true;
            info!("Quick-add button clicked, opening full editor");
            if let Err(e) = quick_add::open_full_editor(&mut self.doc) {
                self.log_error(&e);
            }
            return;
        }

        let Some(container) = self.container.as_mut() else {
            return;
        };
        let mut page = PageCtx::new(&mut self.doc, &mut self.timers, &self.config);
        match container.click(&mut page, target, &self.provisioner) {
            Ok(ClickOutcome::Ignored) => {}
            Ok(outcome) => debug!(?outcome, "Button click handled"),
            Err(e) => self.log_error(&e),
        }
    }

    fn on_timer(&mut self, task: Deferred) {
        let mut page = PageCtx::new(&mut self.doc, &mut self.timers, &self.config);
        let result = match task {
            Deferred::LocationEdit { input, text } => complete_location_edit(&mut page, input, &text),
            Deferred::LocationNudge { input } => nudge_location(&mut page, input),
            Deferred::AutoCreate { container: id } => match self.container.as_mut() {
                Some(container) if container.id() == id => container
                    .run_auto_create(&mut page, &self.provisioner)
                    .map(|_| ()),
                _ => {
                    debug!(container = %id.short(), "Auto-create for a replaced container, skipping");
                    Ok(())
                }
            },
        };
        if let Err(e) = result {
            self.log_error(&e);
        }
    }

    fn log_error(&mut self, err: &SyncError) {
        self.stats.errors += 1;
        match err {
            SyncError::ReadinessNotMet(_)
            | SyncError::SurfaceReadOnly(_)
            | SyncError::MalformedExtraction(_)
            | SyncError::MissingAnchor(_) => debug!(error = %err, "Pass skipped"),
            SyncError::Provision(_) | SyncError::Dom(_) => warn!(error = %err, "Pass failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkcal_dom::fixtures::{calendar_view, open_quick_add, G2Page};
    use talkcal_shared::types::{ButtonState, MeetingId};

    use crate::provision::RecordingProvisioner;

    #[derive(Default)]
    struct Counter(usize);

    impl RoomUrlGenerator for Counter {
        fn generate(&mut self) -> MeetingId {
            self.0 += 1;
            MeetingId::new(format!("room-{}", self.0))
        }
    }

    fn watcher(doc: Document) -> MutationWatcher<Counter, RecordingProvisioner> {
        MutationWatcher::new(
            doc,
            SyncConfig::default(),
            Counter::default(),
            RecordingProvisioner::new(),
        )
    }

    #[test]
    fn test_startup_pass_on_loaded_editor() {
        let mut doc = Document::new();
        G2Page::editable().render(&mut doc).unwrap();
        let mut w = watcher(doc);
        w.start();

        let container = w.container().unwrap();
        assert_eq!(container.button_state(), ButtonState::NoMeeting);
        assert!(w.document().get_element_by_id("jitsi_button").is_some());
        assert_eq!(w.stats().containers_created, 1);
    }

    #[test]
    fn test_waits_for_readiness() {
        let mut w = watcher(Document::new());
        w.start();
        assert!(w.container().is_none());

        G2Page {
            notifications: false,
            ..G2Page::editable()
        }
        .render(w.document_mut())
        .unwrap();
        w.run_until_idle();
        assert!(w.container().is_none());
        assert!(w.stats().skipped >= 1);

        let body = w.document().body();
        let list = w.document_mut().create_element("div");
        w.document_mut().set_attr(list, "id", "xNtList").unwrap();
        let row = w.document_mut().create_element("div");
        w.document_mut().append_child(row, list).unwrap();
        w.document_mut().append_child(body, row).unwrap();
        w.run_until_idle();

        assert!(w.document().get_element_by_id("jitsi_button").is_some());
    }

    #[test]
    fn test_text_edits_do_not_trigger_a_pass() {
        let mut doc = Document::new();
        G2Page::editable().render(&mut doc).unwrap();
        let mut w = watcher(doc);
        w.start();
        let passes = w.stats().passes;

        let body = w.document().body();
        let note = w.document_mut().append_text(body, "draft").unwrap();
        w.run_until_idle();
        assert_eq!(w.stats().passes, passes + 1);

        w.document_mut().set_character_data(note, "final").unwrap();
        assert!(w.document().has_pending_mutations());
        w.run_until_idle();

        assert_eq!(w.stats().passes, passes + 1);
        assert!(!w.document().has_pending_mutations());
    }

    #[test]
    fn test_mutations_before_start_are_dropped() {
        let mut doc = Document::new();
        calendar_view(&mut doc);
        open_quick_add(&mut doc).unwrap();
        let mut w = watcher(doc);
        w.start();

        assert!(w.document().get_element_by_id("jitsi_button_quick_add").is_none());
    }

    #[test]
    fn test_stale_auto_create_timer_is_ignored() {
        let mut doc = Document::with_url(
            "https://calendar.google.com/calendar/r/eventedit?autoCreateMeeting=1&extid=ext",
        );
        G2Page::editable().render(&mut doc).unwrap();
        let config = SyncConfig {
            extension_id: "ext".into(),
            ..Default::default()
        };
        let mut w = MutationWatcher::new(doc, config, Counter::default(), RecordingProvisioner::new());
        w.start();
        assert_eq!(w.pending_timers(), 1);

        // user switches to another event before the timer fires
        let button = w.container().unwrap().handles().unwrap().button;
        w.document_mut().remove(button).unwrap();
        w.run_until_idle();
        w.settle();

        assert!(w.provisioner().urls().is_empty());
        assert_eq!(w.stats().containers_created, 2);
        assert_eq!(w.container().unwrap().button_state(), ButtonState::NoMeeting);
    }
}
