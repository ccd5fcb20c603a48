//! Types, constants and text builders shared by every talkcal crate.

pub mod constants;
pub mod error;
pub mod invite;
pub mod roomname;
pub mod types;

pub use error::InviteError;
pub use invite::{DialInNumbers, InviteTemplate};
pub use roomname::{RoomUrlGenerator, WordlistGenerator};
pub use types::{Branding, ButtonState, ContainerId, MeetingId, ViewFamily};
