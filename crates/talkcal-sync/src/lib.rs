// Event-state synchronization engine for the host calendar editor.

pub mod button;
pub mod classifier;
pub mod config;
pub mod container;
pub mod quick_add;
pub mod provision;
pub mod resolver;
pub mod schedule;
pub mod signal;
pub mod surface;
pub mod variant;
pub mod watcher;

mod error;

pub use button::{ButtonAction, ButtonHandles, ButtonStateMachine};
pub use classifier::{classify, PageState};
pub use config::SyncConfig;
pub use container::{ClickOutcome, EventContainer, Reconciled};
pub use error::SyncError;
pub use provision::{LogOnlyProvisioner, ProvisionError, RecordingProvisioner, RoomProvisioner};
pub use resolver::{resolve, Resolution};
pub use schedule::{Deferred, PageCtx, TimerQueue};
pub use signal::AutoCreateSignal;
pub use surface::{DescriptionSurface, LocationSurface, SurfaceKind, TextSurface};
pub use variant::LayoutVariant;
pub use watcher::{MutationWatcher, PageEvent, WatcherStats};
