//! Access state and the per-run session object.
//!
//! `SessionState` is explicitly constructed and owned by the [`crate::manager::Gatekeeper`];
//! collaborators receive it by reference. It replaces the original design's
//! process-wide singleton and mutable static registry.

use crate::config::GatekeeperConfig;
use crate::policy::access::GateStatus;

/// The mutually exclusive access state; exactly one value is active.
///
/// `Checking*` states are transient and only observable for one check's
/// latency. User-visible behavior derives from `Allowed` and the three
/// blocked states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessState {
    /// Before the startup sequence runs.
    Boot,
    /// Reading the persisted local lock flag.
    CheckingLocalLock,
    /// Blocked by the persisted local lock.
    LocalLocked,
    /// Running the geographic check.
    CheckingGeo,
    /// Blocked by the geographic allow-list.
    GeoBlocked,
    /// Running the remote kill-switch check.
    CheckingRemote,
    /// Blocked by the remote kill-switch.
    RemoteBlocked,
    /// All gates pass; the application may run.
    Allowed,
}

impl AccessState {
    /// Whether this state blocks the application.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            AccessState::LocalLocked | AccessState::GeoBlocked | AccessState::RemoteBlocked
        )
    }

    /// Whether this is a transient in-check state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AccessState::Boot
                | AccessState::CheckingLocalLock
                | AccessState::CheckingGeo
                | AccessState::CheckingRemote
        )
    }
}

/// Mutable per-run gating state.
#[derive(Debug)]
pub struct SessionState {
    state: AccessState,
    status: GateStatus,
    shutdown_override: Option<String>,
}

impl SessionState {
    /// Fresh session at boot.
    pub fn new() -> Self {
        Self {
            state: AccessState::Boot,
            status: GateStatus::default(),
            shutdown_override: None,
        }
    }

    /// Current access state.
    pub fn state(&self) -> AccessState {
        self.state
    }

    /// Set the current access state.
    pub fn set_state(&mut self, state: AccessState) {
        self.state = state;
    }

    /// Current gate outcomes.
    pub fn status(&self) -> GateStatus {
        self.status
    }

    /// Mutable gate outcomes.
    pub fn status_mut(&mut self) -> &mut GateStatus {
        &mut self.status
    }

    /// Grant the session geo bypass. One-way: never reset for the process
    /// lifetime.
    pub fn grant_geo_bypass(&mut self) {
        self.status.geo_bypass = true;
    }

    /// Override the shutdown message for the rest of the run.
    pub fn set_shutdown_override(&mut self, message: String) {
        self.shutdown_override = Some(message);
    }

    /// The shutdown message currently in effect.
    pub fn shutdown_message<'a>(&'a self, config: &'a GatekeeperConfig) -> &'a str {
        self.shutdown_override
            .as_deref()
            .unwrap_or(&config.shutdown_message)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
