use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_APP_NAME, DEFAULT_BASE_DOMAIN, MEETING_LABEL_SUFFIX, VIEW_FAMILY_EVENT,
    VIEW_FAMILY_EVENT_EDIT,
};

// Meeting identifier = opaque room slug appended to the base URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MeetingId(pub String);

impl MeetingId {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MeetingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one event container instance. A reset produces a new id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContainerId(pub Uuid);

impl ContainerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two observable states of the injected action button.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    NoMeeting,
    HasMeeting,
}

/// Host view mode read from the body dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ViewFamily {
    /// Calendar grid; quick-add dialogs appear here.
    Event,
    /// Full screen event editor.
    EventEdit,
    /// Some other calendar view we do not act on.
    Other,
}

impl ViewFamily {
    /// `None` means the document is not a calendar page at all.
    pub fn from_dataset(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("") => None,
            Some(VIEW_FAMILY_EVENT) => Some(Self::Event),
            Some(VIEW_FAMILY_EVENT_EDIT) => Some(Self::EventEdit),
            Some(_) => Some(Self::Other),
        }
    }
}

/// Service naming used to build URLs and user-visible strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branding {
    pub base_domain: String,
    pub app_name: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl Branding {
    /// `https://<domain>/`, the prefix every join URL starts with.
    pub fn base_url(&self) -> String {
        format!("https://{}/", self.base_domain)
    }

    pub fn join_url(&self, id: &MeetingId) -> String {
        format!("{}{}", self.base_url(), id)
    }

    /// Marker text written into the location field, e.g. "Brave Talk Meeting".
    pub fn meeting_label(&self) -> String {
        format!("{} {}", self.app_name, MEETING_LABEL_SUFFIX)
    }

    pub fn location_text(&self, id: &MeetingId) -> String {
        format!("{} - {}", self.meeting_label(), self.join_url(id))
    }

    pub fn add_label(&self) -> String {
        format!("Add a {}", self.meeting_label())
    }

    pub fn join_label(&self) -> String {
        format!("Join your {} now", self.meeting_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branding_strings() {
        let branding = Branding::default();
        let id = MeetingId::new("room-alpha");

        assert_eq!(branding.base_url(), "https://talk.brave.com/");
        assert_eq!(branding.join_url(&id), "https://talk.brave.com/room-alpha");
        assert_eq!(
            branding.location_text(&id),
            "Brave Talk Meeting - https://talk.brave.com/room-alpha"
        );
        assert_eq!(branding.add_label(), "Add a Brave Talk Meeting");
        assert_eq!(branding.join_label(), "Join your Brave Talk Meeting now");
    }

    #[test]
    fn test_view_family_parsing() {
        assert_eq!(ViewFamily::from_dataset(None), None);
        assert_eq!(ViewFamily::from_dataset(Some("")), None);
        assert_eq!(ViewFamily::from_dataset(Some("EVENT")), Some(ViewFamily::Event));
        assert_eq!(
            ViewFamily::from_dataset(Some("EVENT_EDIT")),
            Some(ViewFamily::EventEdit)
        );
        assert_eq!(ViewFamily::from_dataset(Some("MONTH")), Some(ViewFamily::Other));
    }

    #[test]
    fn test_container_ids_are_distinct() {
        assert_ne!(ContainerId::new(), ContainerId::new());
        assert_eq!(ContainerId::new().short().len(), 8);
    }

    #[test]
    fn test_container_id_serializes_as_uuid() {
        let id = ContainerId::new();
        let json = serde_json::to_string(&id).unwrap();

        assert_eq!(json, format!("\"{}\"", id.0));
        assert_eq!(serde_json::from_str::<ContainerId>(&json).unwrap(), id);
    }
}
