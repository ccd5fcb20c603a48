/// Default meeting service domain
pub const DEFAULT_BASE_DOMAIN: &str = "talk.brave.com";

/// Default application name shown in labels and invites
pub const DEFAULT_APP_NAME: &str = "Brave Talk";

/// Suffix appended to the app name to form the location label
pub const MEETING_LABEL_SUFFIX: &str = "Meeting";

/// Id of the injected action button (stable "already added" marker)
pub const BUTTON_ID: &str = "jitsi_button";

/// Id of the clickable row wrapping the action button
pub const BUTTON_CONTAINER_ID: &str = "jitsi_button_container";

/// Id of the quick-add affordance injected into the inline create dialog
pub const QUICK_ADD_BUTTON_ID: &str = "jitsi_button_quick_add";

/// Id of the tab panel holding the quick-add affordance
pub const QUICK_ADD_CONTENT_ID: &str = "jitsi_button_quick_add_content";

/// Body dataset key carrying the host view mode
pub const VIEW_FAMILY_KEY: &str = "viewfamily";

/// View mode of the main calendar grid (quick-add popups live here)
pub const VIEW_FAMILY_EVENT: &str = "EVENT";

/// View mode of the full screen event editor
pub const VIEW_FAMILY_EVENT_EDIT: &str = "EVENT_EDIT";

/// Query parameter set by the popup when it opens the create page
pub const AUTO_CREATE_PARAM: &str = "autoCreateMeeting";

/// Query parameter carrying the caller's extension id
pub const EXTENSION_ID_PARAM: &str = "extid";

/// Delay before the host reacts to a programmatic focus (milliseconds)
pub const DEFAULT_FOCUS_SETTLE_MS: u64 = 1;

/// Delay before an automatic add-meeting flow runs (milliseconds)
pub const DEFAULT_AUTO_CREATE_DELAY_MS: u64 = 1_000;

/// Delay before the optional location re-save nudge (milliseconds)
pub const DEFAULT_LOCATION_NUDGE_DELAY_MS: u64 = 1_000;

/// Browsing context name used when opening a join link
pub const JOIN_TARGET: &str = "_blank";
