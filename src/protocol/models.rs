//! Remote-control and geo wire models.

use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Remote kill-switch payload.
///
/// Every field defaults so a partial or empty object parses; absence of a
/// field means "no directive".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteControlResponse {
    /// Server-directed shutdown.
    #[serde(default)]
    pub shutdown: bool,

    /// Replacement for the configured shutdown message.
    #[serde(default)]
    pub message: Option<String>,

    /// Server-granted override of local lock and geo gating.
    #[serde(default)]
    pub force_allow: bool,

    /// Expiry of `force_allow` in epoch seconds; absent or zero means no
    /// expiry.
    #[serde(default)]
    pub force_until: Option<i64>,
}

/// Parse a raw remote-control body.
pub fn parse_remote_response(body: &[u8]) -> Result<RemoteControlResponse, GatekeeperError> {
    serde_json::from_slice(body).map_err(|e| {
        GatekeeperError::ProtocolError(format!("Failed to parse remote-control response: {}", e))
    })
}

/// Extract the country code string from a geo-IP response body.
///
/// The field name is configurable; anything other than a string value at
/// that key counts as missing.
pub fn extract_country(body: &[u8], field: &str) -> Result<String, GatekeeperError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| GatekeeperError::ProtocolError(format!("Failed to parse geo response: {}", e)))?;

    value
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            GatekeeperError::ProtocolError(format!("Geo response missing field '{}'", field))
        })
}

/// Heartbeat status reported to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatStatus {
    /// Application is running: all gates pass and the overlay is hidden.
    Live,
    /// Application is blocked by at least one gate.
    Locked,
}

/// Fire-and-forget status report posted to the remote-control endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatReport {
    /// Stable device identifier.
    pub device: String,

    /// Platform name.
    pub platform: String,

    /// Application version.
    pub version: String,

    /// Gate status at the time of the report.
    pub status: HeartbeatStatus,

    /// UTC timestamp, ISO 8601.
    pub ts_utc: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = r#"{
        "shutdown": true,
        "message": "Maintenance",
        "force_allow": false,
        "force_until": 0
    }"#;

    const FORCE_RESPONSE: &str = r#"{
        "shutdown": false,
        "force_allow": true,
        "force_until": 1750000000
    }"#;

    #[test]
    fn test_parse_full_response() {
        let response = parse_remote_response(FULL_RESPONSE.as_bytes()).unwrap();
        assert!(response.shutdown);
        assert_eq!(response.message.as_deref(), Some("Maintenance"));
        assert!(!response.force_allow);
        assert_eq!(response.force_until, Some(0));
    }

    #[test]
    fn test_parse_force_response() {
        let response = parse_remote_response(FORCE_RESPONSE.as_bytes()).unwrap();
        assert!(!response.shutdown);
        assert!(response.force_allow);
        assert_eq!(response.force_until, Some(1750000000));
    }

    #[test]
    fn test_parse_empty_object_defaults() {
        let response = parse_remote_response(b"{}").unwrap();
        assert!(!response.shutdown);
        assert!(response.message.is_none());
        assert!(!response.force_allow);
        assert!(response.force_until.is_none());
    }

    #[test]
    fn test_parse_malformed_json() {
        let result = parse_remote_response(b"not json");
        assert!(matches!(result, Err(GatekeeperError::ProtocolError(_))));
    }

    #[test]
    fn test_extract_country_default_field() {
        let country = extract_country(br#"{"country":"EG","ip":"1.2.3.4"}"#, "country").unwrap();
        assert_eq!(country, "EG");
    }

    #[test]
    fn test_extract_country_custom_field() {
        let country = extract_country(br#"{"countryCode":"sa"}"#, "countryCode").unwrap();
        assert_eq!(country, "sa");
    }

    #[test]
    fn test_extract_country_missing_field() {
        let result = extract_country(br#"{"ip":"1.2.3.4"}"#, "country");
        assert!(matches!(result, Err(GatekeeperError::ProtocolError(_))));
    }

    #[test]
    fn test_extract_country_non_string_field() {
        let result = extract_country(br#"{"country":42}"#, "country");
        assert!(matches!(result, Err(GatekeeperError::ProtocolError(_))));
    }

    #[test]
    fn test_heartbeat_serializes_lowercase_status() {
        let report = HeartbeatReport {
            device: "dev-1".to_string(),
            platform: "linux".to_string(),
            version: "1.0.0".to_string(),
            status: HeartbeatStatus::Live,
            ts_utc: "2025-01-15T12:00:00+00:00".to_string(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "live");

        let locked = HeartbeatReport {
            status: HeartbeatStatus::Locked,
            ..report
        };
        let json = serde_json::to_value(&locked).unwrap();
        assert_eq!(json["status"], "locked");
    }
}
