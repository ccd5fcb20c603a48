//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults that match the production extension, so the
//! engine runs with zero configuration. The two host-page workarounds are
//! plain flags here so they can be switched off when the host fixes them.

use std::time::Duration;

use talkcal_shared::constants::{
    DEFAULT_AUTO_CREATE_DELAY_MS, DEFAULT_FOCUS_SETTLE_MS, DEFAULT_LOCATION_NUDGE_DELAY_MS,
};
use talkcal_shared::invite::{DialInNumbers, InviteTemplate};
use talkcal_shared::types::Branding;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Meeting service domain and app name.
    /// Env: `TALKCAL_BASE_DOMAIN`, `TALKCAL_APP_NAME`
    /// Default: `talk.brave.com`, `Brave Talk`
    pub branding: Branding,

    /// Caller id the auto-create query parameter must carry.
    /// Env: `TALKCAL_EXTENSION_ID`
    /// Default: empty (auto-create from the URL disabled).
    pub extension_id: String,

    /// Pause between focusing a field and writing into it.
    /// Env: `TALKCAL_FOCUS_SETTLE_MS`
    /// Default: 1 ms
    pub focus_settle: Duration,

    /// Pause before the automatic add-meeting flow runs.
    /// Env: `TALKCAL_AUTO_CREATE_DELAY_MS`
    /// Default: 1000 ms
    pub auto_create_delay: Duration,

    /// Re-focus the location and append a space after a write so the host
    /// persists it on save.
    /// Env: `TALKCAL_LOCATION_NUDGE` (true/false)
    /// Default: `false`
    pub location_resave_nudge: bool,

    /// Env: `TALKCAL_LOCATION_NUDGE_DELAY_MS`
    /// Default: 1000 ms
    pub location_nudge_delay: Duration,

    /// Read the location from the read-only rendering when the input is
    /// missing.
    /// Env: `TALKCAL_READONLY_LOCATION_FALLBACK` (true/false)
    /// Default: `true`
    pub read_only_location_fallback: bool,

    /// Description invite text.
    /// Env: `TALKCAL_INVITE_TEMPLATE`, `TALKCAL_INVITE_NUMBERS_TEMPLATE`,
    /// `TALKCAL_DIAL_IN_NUMBERS` (JSON)
    pub invite: InviteTemplate,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            branding: Branding::default(),
            extension_id: String::new(),
            focus_settle: Duration::from_millis(DEFAULT_FOCUS_SETTLE_MS),
            auto_create_delay: Duration::from_millis(DEFAULT_AUTO_CREATE_DELAY_MS),
            location_resave_nudge: false,
            location_nudge_delay: Duration::from_millis(DEFAULT_LOCATION_NUDGE_DELAY_MS),
            read_only_location_fallback: true,
            invite: InviteTemplate::default(),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(domain) = var("TALKCAL_BASE_DOMAIN") {
            let domain = domain.trim().trim_end_matches('/');
            if domain.is_empty() || domain.contains("://") {
                tracing::warn!(value = %domain, "Invalid TALKCAL_BASE_DOMAIN, using default");
            } else {
                config.branding.base_domain = domain.to_string();
            }
        }

        if let Some(name) = var("TALKCAL_APP_NAME") {
            if !name.trim().is_empty() {
                config.branding.app_name = name.trim().to_string();
            }
        }

        if let Some(id) = var("TALKCAL_EXTENSION_ID") {
            config.extension_id = id.trim().to_string();
        }

        if let Some(delay) = parse_millis(&var, "TALKCAL_FOCUS_SETTLE_MS") {
            config.focus_settle = delay;
        }

        if let Some(delay) = parse_millis(&var, "TALKCAL_AUTO_CREATE_DELAY_MS") {
            config.auto_create_delay = delay;
        }

        if let Some(val) = var("TALKCAL_LOCATION_NUDGE") {
            config.location_resave_nudge = parse_flag(&val);
        }

        if let Some(delay) = parse_millis(&var, "TALKCAL_LOCATION_NUDGE_DELAY_MS") {
            config.location_nudge_delay = delay;
        }

        if let Some(val) = var("TALKCAL_READONLY_LOCATION_FALLBACK") {
            config.read_only_location_fallback = parse_flag(&val);
        }

        let numbers = match var("TALKCAL_DIAL_IN_NUMBERS") {
            Some(raw) => DialInNumbers::from_json(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid TALKCAL_DIAL_IN_NUMBERS, ignoring");
                DialInNumbers::default()
            }),
            None => DialInNumbers::default(),
        };

        match InviteTemplate::with_templates(
            var("TALKCAL_INVITE_TEMPLATE"),
            var("TALKCAL_INVITE_NUMBERS_TEMPLATE"),
            numbers.clone(),
        ) {
            Ok(invite) => config.invite = invite,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid invite template, using default text");
                config.invite = InviteTemplate {
                    numbers,
                    ..Default::default()
                };
            }
        }

        config
    }
}

fn parse_flag(val: &str) -> bool {
    val != "false" && val != "0"
}

fn parse_millis(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = var(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid duration, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::from_vars(vars(&[]));
        assert_eq!(config.branding.base_url(), "https://talk.brave.com/");
        assert_eq!(config.focus_settle, Duration::from_millis(1));
        assert_eq!(config.auto_create_delay, Duration::from_millis(1000));
        assert!(!config.location_resave_nudge);
        assert!(config.read_only_location_fallback);
        assert!(config.extension_id.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_vars(vars(&[
            ("TALKCAL_BASE_DOMAIN", "meet.example.org/"),
            ("TALKCAL_APP_NAME", "Example Meet"),
            ("TALKCAL_EXTENSION_ID", "abcdef"),
            ("TALKCAL_AUTO_CREATE_DELAY_MS", "250"),
            ("TALKCAL_LOCATION_NUDGE", "true"),
            ("TALKCAL_READONLY_LOCATION_FALLBACK", "0"),
            ("TALKCAL_DIAL_IN_NUMBERS", r#"[["US", ["+1 555 0100"]]]"#),
        ]));

        assert_eq!(config.branding.base_url(), "https://meet.example.org/");
        assert_eq!(config.branding.meeting_label(), "Example Meet Meeting");
        assert_eq!(config.extension_id, "abcdef");
        assert_eq!(config.auto_create_delay, Duration::from_millis(250));
        assert!(config.location_resave_nudge);
        assert!(!config.read_only_location_fallback);
        assert!(!config.invite.numbers.is_empty());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = SyncConfig::from_vars(vars(&[
            ("TALKCAL_BASE_DOMAIN", "https://bad"),
            ("TALKCAL_FOCUS_SETTLE_MS", "soon"),
            ("TALKCAL_DIAL_IN_NUMBERS", "nope"),
            ("TALKCAL_INVITE_TEMPLATE", "   "),
        ]));

        assert_eq!(config.branding.base_domain, "talk.brave.com");
        assert_eq!(config.focus_settle, Duration::from_millis(1));
        assert!(config.invite.numbers.is_empty());
        assert!(config.invite.text_template.is_none());
    }
}
