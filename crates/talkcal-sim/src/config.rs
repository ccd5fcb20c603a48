//! Runner configuration loaded from environment variables.
//!
//! Engine settings come from [`SyncConfig::from_env`]; this adds the two
//! knobs that only make sense for the scenario runner.

use std::path::PathBuf;

use talkcal_sync::SyncConfig;

#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// JSON scenario to replay.
    /// Env: `TALKCAL_SCENARIO`
    /// Default: none (the built-in add-meeting scenario runs).
    pub scenario: Option<PathBuf>,

    /// Endpoint that receives `{"url": ...}` for every created room.
    /// Env: `TALKCAL_PROVISION_ENDPOINT`
    /// Default: none (rooms are only logged).
    pub provision_endpoint: Option<String>,

    pub sync: SyncConfig,
}

impl SimConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            sync: SyncConfig::from_vars(&var),
            ..Default::default()
        };

        if let Some(path) = var("TALKCAL_SCENARIO") {
            if !path.trim().is_empty() {
                config.scenario = Some(PathBuf::from(path.trim()));
            }
        }

        if let Some(endpoint) = var("TALKCAL_PROVISION_ENDPOINT") {
            let endpoint = endpoint.trim();
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                config.provision_endpoint = Some(endpoint.to_string());
            } else if !endpoint.is_empty() {
                tracing::warn!(value = %endpoint, "Invalid TALKCAL_PROVISION_ENDPOINT, ignoring");
            }
        }

        config
    }
}
