//! Gatekeeper configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum poll interval in seconds; smaller configured values are clamped.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Configuration for the access gate.
///
/// Loaded once and read-only for the run (the shutdown message can be
/// overridden at runtime by the remote service, which is tracked in session
/// state, not here). All fields have serde defaults so a partial JSON config
/// deserializes; `validate` catches the errors a human must fix, while
/// everything else degrades: an empty `remote_url` disables the remote gate
/// and an empty code digest is permanently non-matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Two-letter country codes allowed to run the application.
    pub allowed_countries: Vec<String>,

    /// Geo-IP lookup endpoint. A cache-buster is always appended.
    pub geo_url: String,

    /// JSON field holding the country code in the geo response.
    pub geo_field: String,

    /// Remote kill-switch endpoint; also receives heartbeat reports.
    /// Empty string disables the remote gate entirely.
    pub remote_url: String,

    /// Background poll interval in seconds (minimum 1).
    pub poll_interval_secs: u64,

    /// Whether an unreachable remote endpoint blocks (`true`) or allows
    /// (`false`, the default).
    pub fail_closed: bool,

    /// SHA-256 hex digest of the admin lock code. Empty never matches.
    pub lock_code_digest: String,

    /// SHA-256 hex digest of the admin unlock code. Empty never matches.
    pub unlock_code_digest: String,

    /// Message shown when the geographic check fails.
    pub region_message: String,

    /// Message shown when locally locked or remotely shut down. The remote
    /// service may override this for the rest of the run.
    pub shutdown_message: String,

    /// Consult the process locale as an allow-only geo hint when the geo
    /// endpoint is unreachable.
    pub locale_fallback: bool,

    /// City name whose presence in the local timezone identifier counts as
    /// an allow-only geo hint when the geo endpoint is unreachable.
    pub timezone_city_hint: Option<String>,

    /// Stable device identifier reported in heartbeats.
    pub device_id: String,

    /// Platform name reported in heartbeats.
    pub platform: String,

    /// Application version reported in heartbeats.
    pub app_version: String,

    /// Namespace for the persisted lock flag under the platform data dir.
    pub store_namespace: String,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            allowed_countries: Vec::new(),
            geo_url: String::new(),
            geo_field: "country".to_string(),
            remote_url: String::new(),
            poll_interval_secs: 60,
            fail_closed: false,
            lock_code_digest: String::new(),
            unlock_code_digest: String::new(),
            region_message: "This application is not available in your region.".to_string(),
            shutdown_message: "This application is currently unavailable.".to_string(),
            locale_fallback: false,
            timezone_city_hint: None,
            device_id: String::new(),
            platform: std::env::consts::OS.to_string(),
            app_version: String::new(),
            store_namespace: "gatekeeper".to_string(),
        }
    }
}

impl GatekeeperConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::GatekeeperError> {
        if self.store_namespace.is_empty() {
            return Err(crate::GatekeeperError::ConfigError(
                "store_namespace cannot be empty".to_string(),
            ));
        }
        if self.geo_field.is_empty() {
            return Err(crate::GatekeeperError::ConfigError(
                "geo_field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Poll interval with the minimum floor applied.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(MIN_POLL_INTERVAL_SECS))
    }

    /// Whether a normalized (trimmed, upper-cased) country code is allowed.
    pub fn country_allowed(&self, code: &str) -> bool {
        self.allowed_countries
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = GatekeeperConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_namespace_rejected() {
        let config = GatekeeperConfig {
            store_namespace: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_geo_field_rejected() {
        let config = GatekeeperConfig {
            geo_field: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn poll_interval_floor() {
        let config = GatekeeperConfig {
            poll_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));

        let config = GatekeeperConfig {
            poll_interval_secs: 30,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn country_allowed_is_case_insensitive() {
        let config = GatekeeperConfig {
            allowed_countries: vec!["EG".to_string(), "sa".to_string()],
            ..Default::default()
        };
        assert!(config.country_allowed("EG"));
        assert!(config.country_allowed("eg"));
        assert!(config.country_allowed("SA"));
        assert!(!config.country_allowed("US"));
    }

    #[test]
    fn partial_json_deserializes_with_defaults() {
        let config: GatekeeperConfig = serde_json::from_str(
            r#"{
                "allowed_countries": ["EG"],
                "remote_url": "https://control.example.com/gate"
            }"#,
        )
        .unwrap();

        assert_eq!(config.allowed_countries, vec!["EG"]);
        assert_eq!(config.geo_field, "country");
        assert_eq!(config.poll_interval_secs, 60);
        assert!(!config.fail_closed);
        assert!(config.validate().is_ok());
    }
}
