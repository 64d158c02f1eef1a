//! Reqwest-based control-plane client.
//!
//! Issues the geo-IP lookup, the remote kill-switch poll, and the heartbeat
//! report. Transport and parse failures are absorbed into decisions here per
//! the endpoint policies; callers never see an error from the gating paths.

use crate::client::{fallback, ControlPlane, GeoCheck, RemoteCheck};
use crate::clock::Clock;
use crate::config::GatekeeperConfig;
use crate::policy::access::force_window_active;
use crate::protocol::models::{extract_country, parse_remote_response, HeartbeatReport};
use crate::GatekeeperError;
use reqwest::blocking::Client;
use std::sync::Arc;
use std::time::Duration;

/// Fixed per-request timeout. Retry is structural (the next poll tick or a
/// forced refresh), never a tight loop here.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Production control-plane client.
pub struct HttpControl {
    client: Client,
    config: GatekeeperConfig,
    clock: Arc<dyn Clock>,
}

impl HttpControl {
    /// Create a control-plane client from config.
    pub fn new(config: &GatekeeperConfig, clock: Arc<dyn Clock>) -> Result<Self, GatekeeperError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                GatekeeperError::ControlTransport(format!("Failed to create client: {}", e))
            })?;

        Ok(Self {
            client,
            config: config.clone(),
            clock,
        })
    }

    /// Fetch the country code from the geo endpoint.
    fn fetch_country(&self) -> Result<String, GatekeeperError> {
        if self.config.geo_url.is_empty() {
            return Err(GatekeeperError::ControlTransport(
                "Geo endpoint not configured".to_string(),
            ));
        }

        let url = with_query(&self.config.geo_url, &format!("_cb={}", self.clock.unix_millis()));

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| GatekeeperError::ControlTransport(format!("Geo request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatekeeperError::ControlTransport(format!(
                "Geo request returned {}",
                status.as_u16()
            )));
        }

        let body = response.bytes().map_err(|e| {
            GatekeeperError::ControlTransport(format!("Failed to read geo body: {}", e))
        })?;

        extract_country(&body, &self.config.geo_field)
    }

    /// Allow-only hints consulted when the HTTP path could not determine a
    /// country. A determined deny never reaches here.
    fn geo_fallback(&self) -> GeoCheck {
        if self.config.locale_fallback {
            if let Some(code) = fallback::locale_country() {
                if self.config.country_allowed(&code) {
                    tracing::debug!(country = %code, "geo allowed via locale hint");
                    return GeoCheck {
                        pass: true,
                        country: Some(code),
                    };
                }
            }
        }

        if let Some(city) = &self.config.timezone_city_hint {
            if fallback::timezone_mentions(city) {
                tracing::debug!(city = %city, "geo allowed via timezone hint");
                return GeoCheck {
                    pass: true,
                    country: None,
                };
            }
        }

        GeoCheck {
            pass: false,
            country: None,
        }
    }
}

impl ControlPlane for HttpControl {
    fn check_geo(&self) -> GeoCheck {
        match self.fetch_country() {
            Ok(raw) => {
                let code = raw.trim().to_ascii_uppercase();
                let pass = self.config.country_allowed(&code);
                tracing::debug!(country = %code, pass, "geo check resolved");
                GeoCheck {
                    pass,
                    country: Some(code),
                }
            }
            Err(e) => {
                tracing::warn!("geo check undeterminable: {}", e);
                self.geo_fallback()
            }
        }
    }

    fn check_remote(&self, forced: bool) -> RemoteCheck {
        if self.config.remote_url.is_empty() {
            // Gate disabled by configuration.
            return RemoteCheck::passing();
        }

        let url = if forced {
            with_query(
                &self.config.remote_url,
                &format!("_cb={}", self.clock.unix_millis()),
            )
        } else {
            self.config.remote_url.clone()
        };

        let response = match self.client.get(&url).send() {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(fail_closed = self.config.fail_closed, "remote check failed: {}", e);
                return RemoteCheck::unreachable(self.config.fail_closed);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                fail_closed = self.config.fail_closed,
                "remote check returned error status"
            );
            return RemoteCheck::unreachable(self.config.fail_closed);
        }

        let body = match response.bytes() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("failed to read remote body: {}", e);
                return RemoteCheck::unreachable(self.config.fail_closed);
            }
        };

        let parsed = match parse_remote_response(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Reachable but malformed: treated as no actionable payload.
                tracing::warn!("remote response unparseable, passing: {}", e);
                return RemoteCheck::passing();
            }
        };

        let force_allow = force_window_active(
            parsed.force_allow,
            parsed.force_until,
            self.clock.epoch_seconds(),
        );

        RemoteCheck {
            pass: !parsed.shutdown,
            message_override: parsed.message.filter(|m| !m.is_empty()),
            force_allow,
        }
    }

    fn send_heartbeat(&self, report: &HeartbeatReport) {
        if self.config.remote_url.is_empty() {
            return;
        }

        let url = with_query(&self.config.remote_url, "report=1");

        match self.client.post(&url).json(report).send() {
            Ok(response) => {
                // Non-2xx is not an error condition for local state.
                tracing::debug!(status = response.status().as_u16(), "heartbeat sent");
            }
            Err(e) => {
                tracing::debug!("heartbeat dropped: {}", e);
            }
        }
    }
}

/// Append a query fragment with the right separator.
fn with_query(url: &str, query: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, sep, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn test_config() -> GatekeeperConfig {
        GatekeeperConfig {
            allowed_countries: vec!["EG".to_string()],
            geo_url: "https://geo.example.com/lookup".to_string(),
            remote_url: "https://control.example.com/gate".to_string(),
            ..Default::default()
        }
    }

    fn test_clock() -> Arc<dyn Clock> {
        Arc::new(MockClock::from_rfc3339("2025-01-15T12:00:00Z"))
    }

    #[test]
    fn test_client_creation() {
        let control = HttpControl::new(&test_config(), test_clock());
        assert!(control.is_ok());
    }

    #[test]
    fn test_with_query_separator() {
        assert_eq!(
            with_query("https://a.example.com/x", "_cb=1"),
            "https://a.example.com/x?_cb=1"
        );
        assert_eq!(
            with_query("https://a.example.com/x?k=v", "_cb=1"),
            "https://a.example.com/x?k=v&_cb=1"
        );
    }

    #[test]
    fn test_disabled_remote_gate_passes() {
        let config = GatekeeperConfig {
            remote_url: String::new(),
            ..test_config()
        };
        let control = HttpControl::new(&config, test_clock()).unwrap();
        let check = control.check_remote(true);
        assert!(check.pass);
        assert!(!check.force_allow);
    }

    #[test]
    fn test_geo_fallback_disabled_by_default() {
        // No locale fallback, no timezone hint: an undeterminable check
        // fails outright.
        let control = HttpControl::new(&test_config(), test_clock()).unwrap();
        let check = control.geo_fallback();
        assert!(!check.pass);
        assert!(check.country.is_none());
    }
}
