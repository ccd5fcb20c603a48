//! Meeting identifier resolution.
//!
//! The identifier is derived from the surfaces whenever possible so that
//! re-opening an already configured event never mints a second room. The
//! location wins over the description. Only when neither carries a link is
//! a fresh identifier requested from the generator.

use tracing::debug;

use talkcal_dom::Document;
use talkcal_shared::types::MeetingId;

use crate::error::SyncError;
use crate::surface::{SurfaceKind, TextSurface};

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Found in a surface.
    Derived { id: MeetingId, source: SurfaceKind },
    /// Nothing found; minted by the generator.
    Allocated(MeetingId),
}

impl Resolution {
    pub fn id(&self) -> &MeetingId {
        match self {
            Resolution::Derived { id, .. } | Resolution::Allocated(id) => id,
        }
    }

    pub fn into_id(self) -> MeetingId {
        match self {
            Resolution::Derived { id, .. } | Resolution::Allocated(id) => id,
        }
    }

    pub fn is_allocated(&self) -> bool {
        matches!(self, Resolution::Allocated(_))
    }
}

/// Resolve the identifier, calling `request_new` only when no surface
/// carries one.
pub fn resolve<L, D, F>(
    doc: &Document,
    location: &L,
    description: &D,
    base_url: &str,
    request_new: F,
) -> Resolution
where
    L: TextSurface,
    D: TextSurface,
    F: FnOnce() -> MeetingId,
{
    match derive(doc, location, description, base_url) {
        Some((id, source)) => {
            debug!(%id, %source, "Derived meeting id from surface");
            Resolution::Derived { id, source }
        }
        None => {
            let id = request_new();
            debug!(%id, "No meeting link on the page, allocated a new id");
            Resolution::Allocated(id)
        }
    }
}

/// Read-only half of [`resolve`]: the identifier present on the page, if any.
pub fn derive<L, D>(
    doc: &Document,
    location: &L,
    description: &D,
    base_url: &str,
) -> Option<(MeetingId, SurfaceKind)>
where
    L: TextSurface,
    D: TextSurface,
{
    [
        location.current_text(doc).map(|t| (t, location.kind())),
        description.current_text(doc).map(|t| (t, description.kind())),
    ]
    .into_iter()
    .flatten()
    .find_map(|(text, kind)| candidate_in(&text, base_url).map(|id| (MeetingId(id), kind)))
}

/// The identifier following the first occurrence of `base_url` in `text`.
pub fn candidate_in(text: &str, base_url: &str) -> Option<String> {
    let start = text.find(base_url)? + base_url.len();
    let candidate = match isolate_identifier(&text[start..]) {
        Ok(id) => id,
        Err(SyncError::MalformedExtraction(best_effort)) => {
            debug!(candidate = %best_effort, "Using best-effort meeting id");
            best_effort
        }
        Err(_) => return None,
    };

    (!candidate.is_empty()).then_some(candidate)
}

/// Take the leading run of identifier characters.
///
/// Any other character ends the run, and a tail made only of identifier
/// characters is taken whole. Fails with [`SyncError::MalformedExtraction`]
/// (carrying the truncated run) when the run is cut by a non-ASCII letter or
/// digit, which means the link holds a slug we could not have generated.
pub fn isolate_identifier(tail: &str) -> Result<String, SyncError> {
    let end = tail.find(|c| !is_identifier_char(c)).unwrap_or(tail.len());
    let run = tail[..end].to_string();

    match tail[end..].chars().next() {
        Some(next) if next.is_alphanumeric() => Err(SyncError::MalformedExtraction(run)),
        _ => Ok(run),
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use talkcal_dom::fixtures::G2Page;

    use crate::surface::{DescriptionSurface, LocationSurface};

    const BASE: &str = "https://talk.brave.com/";

    fn surfaces() -> (LocationSurface, DescriptionSurface) {
        (
            LocationSurface::G2 {
                read_only_fallback: true,
            },
            DescriptionSurface::G2,
        )
    }

    fn page(location: &str, description: &str) -> Document {
        let mut doc = Document::new();
        G2Page::editable()
            .location(location)
            .description(description)
            .render(&mut doc)
            .unwrap();
        doc
    }

    #[test]
    fn test_location_wins_and_suffix_is_stripped() {
        let doc = page(
            "https://talk.brave.com/room-alpha, Conference Room B",
            "Join https://talk.brave.com/room-gamma",
        );
        let (location, description) = surfaces();
        let calls = Cell::new(0);

        let resolution = resolve(&doc, &location, &description, BASE, || {
            calls.set(calls.get() + 1);
            MeetingId::new("unused")
        });

        assert_eq!(
            resolution,
            Resolution::Derived {
                id: MeetingId::new("room-alpha"),
                source: SurfaceKind::Location
            }
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_falls_back_to_description() {
        let doc = page("", "Notes\nhttps://talk.brave.com/room-beta");
        let (location, description) = surfaces();

        let resolution = resolve(&doc, &location, &description, BASE, || {
            panic!("generator must not run")
        });
        assert_eq!(resolution.id(), &MeetingId::new("room-beta"));
        assert!(!resolution.is_allocated());
    }

    #[test]
    fn test_allocates_when_empty() {
        let doc = page("", "");
        let (location, description) = surfaces();

        let resolution = resolve(&doc, &location, &description, BASE, || {
            MeetingId::new("QuietOttersGatherSoftly")
        });
        assert!(resolution.is_allocated());
        assert_eq!(resolution.into_id().as_str(), "QuietOttersGatherSoftly");
    }

    #[test]
    fn test_location_without_link_does_not_block_description() {
        let doc = page("Room 4", "https://talk.brave.com/FromNotes");
        let (location, description) = surfaces();

        let (id, source) = derive(&doc, &location, &description, BASE).unwrap();
        assert_eq!(id.as_str(), "FromNotes");
        assert_eq!(source, SurfaceKind::Description);
    }

    #[test]
    fn test_candidate_extraction() {
        assert_eq!(candidate_in("https://talk.brave.com/abc", BASE).as_deref(), Some("abc"));
        assert_eq!(
            candidate_in("Brave Talk Meeting - https://talk.brave.com/Xyz12 more", BASE).as_deref(),
            Some("Xyz12")
        );
        assert_eq!(
            candidate_in("see https://talk.brave.com/abc.", BASE).as_deref(),
            Some("abc")
        );
        assert_eq!(candidate_in("https://talk.brave.com/?x=1", BASE), None);
        assert_eq!(candidate_in("https://talk.brave.com/", BASE), None);
        assert_eq!(candidate_in("no link here", BASE), None);
    }

    #[test]
    fn test_any_other_character_ends_the_run() {
        assert_eq!(
            candidate_in("https://talk.brave.com/room1\n\n=====\nJust", BASE).as_deref(),
            Some("room1")
        );
        assert_eq!(
            candidate_in("https://talk.brave.com/room1=====Just", BASE).as_deref(),
            Some("room1")
        );
        assert_eq!(
            candidate_in("(https://talk.brave.com/Abc-d_e)", BASE).as_deref(),
            Some("Abc-d_e")
        );
        assert_eq!(candidate_in("https://talk.brave.com/=x", BASE), None);
    }

    #[test]
    fn test_malformed_tail_degrades_to_best_effort() {
        assert!(matches!(
            isolate_identifier("caf\u{e9}-room"),
            Err(SyncError::MalformedExtraction(run)) if run == "caf"
        ));
        assert_eq!(
            candidate_in("https://talk.brave.com/caf\u{e9}-room", BASE).as_deref(),
            Some("caf")
        );
    }
}
