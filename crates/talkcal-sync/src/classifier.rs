//! Which mode the host page is in and whether it is ready to act on.

use talkcal_dom::Document;
use talkcal_shared::types::ViewFamily;

use crate::variant::LayoutVariant;

/// Snapshot of the page as seen by one watcher pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    /// `None` when the page carries no view flag at all.
    pub mode: Option<ViewFamily>,
    /// Detected layout, only looked for in edit mode.
    pub variant: Option<LayoutVariant>,
    /// The variant's readiness gates all hold.
    pub ready: bool,
}

impl PageState {
    pub fn is_quick_add_mode(&self) -> bool {
        self.mode == Some(ViewFamily::Event)
    }

    pub fn is_edit_mode(&self) -> bool {
        self.mode == Some(ViewFamily::EventEdit)
    }
}

pub fn classify(doc: &Document) -> PageState {
    let mode = ViewFamily::from_dataset(doc.view_family());
    let variant = match mode {
        Some(ViewFamily::EventEdit) => LayoutVariant::detect(doc),
        _ => None,
    };
    let ready = variant.as_ref().is_some_and(|v| v.is_ready(doc));

    PageState {
        mode,
        variant,
        ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use talkcal_dom::fixtures::{calendar_view, G2Page};

    #[test]
    fn test_no_calendar() {
        let doc = Document::new();
        let state = classify(&doc);
        assert_eq!(state.mode, None);
        assert!(!state.ready);
    }

    #[test]
    fn test_calendar_grid() {
        let mut doc = Document::new();
        calendar_view(&mut doc);
        let state = classify(&doc);
        assert!(state.is_quick_add_mode());
        assert_eq!(state.variant, None);
    }

    #[test]
    fn test_edit_page_readiness() {
        let mut doc = Document::new();
        let editor = G2Page {
            notifications: false,
            ..G2Page::editable()
        }
        .render(&mut doc)
        .unwrap();

        let state = classify(&doc);
        assert!(state.is_edit_mode());
        assert_eq!(state.variant, Some(LayoutVariant::G2));
        assert!(!state.ready);

        doc.remove(editor).unwrap();
        G2Page::editable().render(&mut doc).unwrap();
        assert!(classify(&doc).ready);
    }

    #[test]
    fn test_unknown_view() {
        let mut doc = Document::new();
        G2Page::editable().render(&mut doc).unwrap();
        doc.set_view_family("MONTH");

        let state = classify(&doc);
        assert_eq!(state.mode, Some(ViewFamily::Other));
        assert!(!state.ready);
    }
}
