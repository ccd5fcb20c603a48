//! Deferred work on a virtual clock.
//!
//! The engine has two suspension points: after focusing a field (so the
//! host's focus handlers run before we write) and before an automatic
//! add-meeting flow (so the host finishes rendering). Both are one-shot,
//! uncancellable timers. Payloads are plain data rather than closures, and
//! the watcher re-checks the target when a timer fires.

use std::collections::BTreeMap;
use std::time::Duration;

use talkcal_dom::{Document, NodeId};
use talkcal_shared::types::ContainerId;

use crate::config::SyncConfig;

/// Work scheduled for later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// Finish a location write once the host has reacted to focus.
    LocationEdit { input: NodeId, text: String },
    /// Second touch of the location that makes the host keep the write.
    LocationNudge { input: NodeId },
    /// Run the add-meeting flow for the container created with auto-create.
    AutoCreate { container: ContainerId },
}

/// One-shot timers ordered by due time, then by scheduling order.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    seq: u64,
    pending: BTreeMap<(Duration, u64), Deferred>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: Deferred) {
        let due = self.now + delay;
        self.seq += 1;
        tracing::trace!(?due, ?task, "Scheduled deferred task");
        self.pending.insert((due, self.seq), task);
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Pop the earliest task due at or before `deadline`, moving the clock
    /// to its due time.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<Deferred> {
        let key = *self.pending.keys().next()?;
        if key.0 > deadline {
            return None;
        }
        let task = self.pending.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(task)
    }

    /// Move the clock forward without running anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// What a surface or container may touch during one event: the page, the
/// timer queue and the configuration.
pub struct PageCtx<'a> {
    pub doc: &'a mut Document,
    pub timers: &'a mut TimerQueue,
    pub config: &'a SyncConfig,
}

impl<'a> PageCtx<'a> {
    pub fn new(doc: &'a mut Document, timers: &'a mut TimerQueue, config: &'a SyncConfig) -> Self {
        Self {
            doc,
            timers,
            config,
        }
    }
}
