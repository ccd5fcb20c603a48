//! Room provisioning boundary.
//!
//! Creating the room on the meeting service is fire-and-forget: the join URL
//! is deterministic from the identifier, so the button shows it whether or
//! not provisioning succeeded. Failures come back as [`ProvisionError`] and
//! are logged by the caller.

use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    #[error("Room service rejected {0}")]
    Rejected(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Room service unavailable")]
    Unavailable,
}

/// Notified once per add-meeting flow with the join URL.
pub trait RoomProvisioner {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError>;
}

impl<P: RoomProvisioner + ?Sized> RoomProvisioner for &P {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError> {
        (**self).create_room(url)
    }
}

impl<P: RoomProvisioner + ?Sized> RoomProvisioner for Box<P> {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError> {
        (**self).create_room(url)
    }
}

/// Default provisioner: the room is created lazily by the service on first
/// join, so logging is enough.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyProvisioner;

impl RoomProvisioner for LogOnlyProvisioner {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError> {
        info!(url, "Room requested");
        Ok(())
    }
}

/// Keeps every requested URL, optionally failing each call.
#[derive(Debug, Default)]
pub struct RecordingProvisioner {
    urls: Mutex<Vec<String>>,
    fail_with: Option<ProvisionError>,
}

impl RecordingProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record calls but answer each with `error`.
    pub fn failing(error: ProvisionError) -> Self {
        Self {
            urls: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl RoomProvisioner for RecordingProvisioner {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError> {
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_provisioner() {
        let provisioner = RecordingProvisioner::new();
        provisioner.create_room("https://talk.brave.com/a").unwrap();
        provisioner.create_room("https://talk.brave.com/b").unwrap();

        assert_eq!(
            provisioner.urls(),
            vec!["https://talk.brave.com/a", "https://talk.brave.com/b"]
        );
    }

    #[test]
    fn test_failing_provisioner_still_records() {
        let provisioner = RecordingProvisioner::failing(ProvisionError::Unavailable);
        let by_ref = &provisioner;

        assert_eq!(
            by_ref.create_room("https://talk.brave.com/a"),
            Err(ProvisionError::Unavailable)
        );
        assert_eq!(provisioner.urls().len(), 1);
    }
}
