use thiserror::Error;

use talkcal_dom::DomError;

use crate::provision::ProvisionError;
use crate::surface::SurfaceKind;

/// Every failure the engine can hit. None of them is fatal to the page:
/// callers log and carry on, leaving the host page usable.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Required page anchors are missing; wait for the next mutation.
    #[error("Page not ready: {0}")]
    ReadinessNotMet(String),

    /// An append hit a surface this viewer cannot edit.
    #[error("{0} surface is read-only")]
    SurfaceReadOnly(SurfaceKind),

    /// The room provisioning collaborator failed.
    #[error("Room provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// The identifier could not be cleanly isolated; carries the best-effort value.
    #[error("Could not cleanly isolate meeting id from {0:?}")]
    MalformedExtraction(String),

    /// A node we need to attach to is gone.
    #[error("Missing page anchor: {0}")]
    MissingAnchor(&'static str),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}
