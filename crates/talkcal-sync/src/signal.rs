//! Auto-create request carried in the page URL.
//!
//! The extension popup opens the calendar with `?autoCreateMeeting=1&extid=<id>`.
//! The flag only counts when `extid` matches the caller id we trust, so other
//! pages cannot make us create meetings by crafting a link.

use tracing::debug;
use url::Url;

use talkcal_shared::constants::{AUTO_CREATE_PARAM, EXTENSION_ID_PARAM};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoCreateSignal(bool);

impl AutoCreateSignal {
    pub fn is_requested(self) -> bool {
        self.0
    }

    /// Parse the signal from `page_url`. An empty `trusted_id` disables it.
    pub fn from_page_url(page_url: &str, trusted_id: &str) -> Self {
        if trusted_id.is_empty() {
            return Self(false);
        }
        let Ok(url) = Url::parse(page_url) else {
            return Self(false);
        };

        let mut flag = false;
        let mut caller = None;
        for (key, value) in url.query_pairs() {
            if key == AUTO_CREATE_PARAM {
                flag = !value.is_empty();
            } else if key == EXTENSION_ID_PARAM {
                caller = Some(value.into_owned());
            }
        }

        let trusted = caller.as_deref() == Some(trusted_id);
        if flag && !trusted {
            debug!(?caller, "Ignoring auto-create request from untrusted caller");
        }
        Self(flag && trusted)
    }
}
