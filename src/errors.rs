//! Gatekeeper error types.

use thiserror::Error;

/// Errors that can occur while constructing or persisting gate state.
///
/// Network and parse failures on the gating paths are deliberately absent:
/// those are absorbed into pass/fail gate decisions by the client layer.
/// This enum covers the conditions a human has to fix.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Failed to build the HTTP control-plane client.
    #[error("Control transport error: {0}")]
    ControlTransport(String),

    /// Failed to parse a control-plane payload.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Lock store I/O error.
    #[error("Lock store I/O error: {0}")]
    StoreIO(String),
}
