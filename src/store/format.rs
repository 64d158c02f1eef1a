//! Persisted lock record format.

use crate::clock::Clock;
use crate::GatekeeperError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// On-disk representation of the local lock flag.
///
/// `updated_at` is diagnostic only; nothing reads it back for decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    /// Whether the application is locally locked.
    pub locked: bool,

    /// When the flag was last written (ISO 8601).
    pub updated_at: DateTime<Utc>,
}

impl LockRecord {
    /// Create a record stamped with the current time.
    pub fn new(locked: bool, clock: &dyn Clock) -> Self {
        Self {
            locked,
            updated_at: clock.now_utc(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, GatekeeperError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to serialize lock record: {}", e)))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, GatekeeperError> {
        serde_json::from_str(json).map_err(|e| {
            GatekeeperError::StoreIO(format!("Failed to deserialize lock record: {}", e))
        })
    }
}
