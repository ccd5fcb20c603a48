//! # talkcal-dom
//!
//! In-memory model of the host calendar page.
//!
//! The page belongs to someone else and changes under our feet, so the model
//! only offers what a content script can observe or do on a live document:
//! look nodes up, read text and form values, append content, focus and
//! dispatch synthetic events, open browsing contexts, and receive batched
//! child-list mutation records. Nodes are stored in an arena and addressed
//! by [`NodeId`]; removed subtrees stay in the arena but are detached, so a
//! stale id is detectable with [`Document::is_connected`].

pub mod document;
pub mod fixtures;
pub mod mutation;
pub mod node;
pub mod selector;

mod error;

pub use document::Document;
pub use error::DomError;
pub use mutation::{DispatchedEvent, EventKind, MutationKind, MutationRecord, OpenedWindow};
pub use node::{El, NodeId};
pub use selector::Selector;
