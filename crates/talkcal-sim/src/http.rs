//! Room provisioning over HTTP.
//!
//! The engine calls [`RoomProvisioner::create_room`] synchronously from its
//! event loop, so the request is spawned onto the runtime and the call
//! returns straight away. [`HttpProvisioner::drain`] waits for whatever is
//! still in flight before the process exits.

use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use talkcal_sync::{LogOnlyProvisioner, ProvisionError, RecordingProvisioner, RoomProvisioner};

use crate::error::SimError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpProvisioner {
    client: reqwest::Client,
    endpoint: String,
    handle: Handle,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpProvisioner {
    pub fn new(endpoint: impl Into<String>, handle: Handle) -> Result<Self, SimError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            handle,
            inflight: Mutex::new(Vec::new()),
        })
    }

    /// Wait for every request spawned so far.
    pub async fn drain(&self) {
        let pending = match self.inflight.lock() {
            Ok(mut inflight) => std::mem::take(&mut *inflight),
            Err(_) => return,
        };
        for task in pending {
            if let Err(e) = task.await {
                warn!(error = %e, "Provisioning task panicked");
            }
        }
    }
}

impl RoomProvisioner for HttpProvisioner {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "url": url }));
        let url = url.to_string();

        let task = self.handle.spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(%url, status = %resp.status(), "Room provisioned");
                }
                Ok(resp) => {
                    warn!(%url, status = %resp.status(), "Room service rejected request");
                }
                Err(e) => {
                    warn!(%url, error = %e, "Room provisioning request failed");
                }
            }
        });

        self.inflight
            .lock()
            .map_err(|_| ProvisionError::Unavailable)?
            .push(task);
        Ok(())
    }
}

/// What the runner hands to the engine: remembers every URL for the
/// report, then forwards to HTTP when an endpoint is set.
pub struct SimProvisioner {
    record: RecordingProvisioner,
    http: Option<HttpProvisioner>,
}

impl SimProvisioner {
    pub fn log_only() -> Self {
        Self {
            record: RecordingProvisioner::new(),
            http: None,
        }
    }

    pub fn with_http(http: HttpProvisioner) -> Self {
        Self {
            record: RecordingProvisioner::new(),
            http: Some(http),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.record.urls()
    }

    pub async fn drain(&self) {
        if let Some(http) = &self.http {
            http.drain().await;
        }
    }
}

impl RoomProvisioner for SimProvisioner {
    fn create_room(&self, url: &str) -> Result<(), ProvisionError> {
        self.record.create_room(url)?;
        match &self.http {
            Some(http) => http.create_room(url),
            None => LogOnlyProvisioner.create_room(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_not_an_error() {
        // port 9 (discard) is closed on test machines; the request fails fast
        let http = HttpProvisioner::new("http://127.0.0.1:9/rooms", Handle::current()).unwrap();
        let provisioner = SimProvisioner::with_http(http);

        assert!(provisioner
            .create_room("https://talk.brave.com/room-1")
            .is_ok());
        provisioner.drain().await;
        assert_eq!(provisioner.urls(), vec!["https://talk.brave.com/room-1"]);
    }

    #[test]
    fn test_log_only_records() {
        let provisioner = SimProvisioner::log_only();
        provisioner.create_room("https://talk.brave.com/a").unwrap();
        assert_eq!(provisioner.urls().len(), 1);
    }
}
