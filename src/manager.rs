//! Access state machine - the main public API for Gatekeeper.
//!
//! `Gatekeeper` owns the gating decision: it sequences the local-lock, geo,
//! and remote checks at startup, reacts to poll ticks, focus-regained
//! events, and admin-code submissions, and drives the blocking overlay.
//! Every operation runs as a critical section over the session state, which
//! serializes remote traffic (one check, one heartbeat in flight) and rules
//! out locked/unlocked flicker between a submission and a poll tick.

use crate::client::http::HttpControl;
use crate::client::{ControlPlane, RemoteCheck};
use crate::clock::{Clock, SystemClock};
use crate::config::GatekeeperConfig;
use crate::crypto::digest::{constant_time_eq, normalize_submitted_code};
use crate::overlay::OverlayGate;
use crate::policy::access::Gate;
use crate::protocol::models::{HeartbeatReport, HeartbeatStatus};
use crate::session::{AccessState, SessionState};
use crate::store::file::FileLockStore;
use crate::GatekeeperError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type StateListener = Arc<dyn Fn(AccessState) + Send + Sync>;
type ListenerRegistry = Mutex<Vec<(u64, StateListener)>>;

/// Handle for a registered state-change listener.
///
/// Dropping the handle deregisters the listener; no callback survives its
/// subscription.
pub struct StateSubscription {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl Drop for StateSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut listeners = registry.lock().unwrap_or_else(|e| e.into_inner());
            listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// The access gate. Create one instance per application and hand it to
/// whatever owns the application lifecycle.
pub struct Gatekeeper {
    config: GatekeeperConfig,
    clock: Arc<dyn Clock>,
    control: Arc<dyn ControlPlane>,
    store: FileLockStore,
    overlay: Arc<dyn OverlayGate>,
    session: Mutex<SessionState>,
    listeners: Arc<ListenerRegistry>,
    next_listener_id: AtomicU64,
}

impl Gatekeeper {
    /// Create a gate with the given configuration and overlay.
    ///
    /// Uses the system clock, the HTTP control plane, and the platform lock
    /// store.
    ///
    /// # Errors
    /// Returns an error if configuration validation fails, the HTTP client
    /// cannot be built, or the store directory cannot be created.
    pub fn new(
        config: GatekeeperConfig,
        overlay: Arc<dyn OverlayGate>,
    ) -> Result<Self, GatekeeperError> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let control: Arc<dyn ControlPlane> =
            Arc::new(HttpControl::new(&config, Arc::clone(&clock))?);
        let store = FileLockStore::new(&config.store_namespace)?;
        Ok(Self::assemble(config, overlay, control, store, clock))
    }

    /// Create a gate from injected parts (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_parts(
        config: GatekeeperConfig,
        overlay: Arc<dyn OverlayGate>,
        control: Arc<dyn ControlPlane>,
        store: FileLockStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatekeeperError> {
        config.validate()?;
        Ok(Self::assemble(config, overlay, control, store, clock))
    }

    fn assemble(
        config: GatekeeperConfig,
        overlay: Arc<dyn OverlayGate>,
        control: Arc<dyn ControlPlane>,
        store: FileLockStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            clock,
            control,
            store,
            overlay,
            session: Mutex::new(SessionState::new()),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Run the startup sequence: local lock, then geo, then remote, in that
    /// order, short-circuiting on the first failing gate. Returns the
    /// resulting state. The background poll loop should be started in every
    /// outcome (see [`crate::poll::PollLoop`]) so a blocked app can
    /// self-heal without a restart.
    pub fn startup(&self) -> AccessState {
        let mut transitions = Vec::new();
        let state = {
            let mut session = self.lock_session();

            self.set_state(&mut session, &mut transitions, AccessState::CheckingLocalLock);
            session.status_mut().locally_locked = self.store.is_locked();

            if session.status().locally_locked {
                // Locked short-circuits the sequence: no geo or remote
                // request is issued.
                self.reevaluate(&mut session, &mut transitions);
            } else {
                self.set_state(&mut session, &mut transitions, AccessState::CheckingGeo);
                let geo = self.control.check_geo();
                session.status_mut().geo_pass = geo.pass;

                if !geo.pass && !session.status().geo_bypass {
                    self.reevaluate(&mut session, &mut transitions);
                } else {
                    self.set_state(&mut session, &mut transitions, AccessState::CheckingRemote);
                    let check = self.control.check_remote(true);
                    self.apply_remote(&mut session, check);
                    self.reevaluate(&mut session, &mut transitions);
                    self.send_heartbeat(&session);
                }
            }

            session.state()
        };
        self.notify(&transitions);
        state
    }

    /// One background poll tick: forced remote check, re-evaluation,
    /// heartbeat.
    pub fn poll_tick(&self) {
        self.forced_refresh();
    }

    /// The application regained foreground focus. A suspended process can
    /// miss poll ticks entirely; this is the resynchronization point.
    pub fn on_focus_regained(&self) {
        tracing::debug!("focus regained, forcing remote refresh");
        self.forced_refresh();
    }

    /// Handle an admin-code submission. Returns whether the code was
    /// accepted. The overlay forwards submitted strings verbatim.
    pub fn submit_code(&self, input: &str) -> bool {
        let submitted = input.trim();

        if submitted.eq_ignore_ascii_case("REFRESH") {
            tracing::info!("admin refresh requested");
            self.forced_refresh();
            return true;
        }

        let normalized = normalize_submitted_code(submitted);

        if digest_matches(&normalized, &self.config.lock_code_digest) {
            tracing::info!("lock code accepted");
            self.lock_locally();
            return true;
        }

        if digest_matches(&normalized, &self.config.unlock_code_digest) {
            tracing::info!("unlock code accepted");
            self.unlock_locally();
            return true;
        }

        tracing::debug!("admin code rejected");
        false
    }

    /// Register a state-change listener. The listener fires for every
    /// transition until the returned subscription is dropped.
    pub fn on_state_change<F>(&self, listener: F) -> StateSubscription
    where
        F: Fn(AccessState) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        StateSubscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    /// Current access state.
    pub fn state(&self) -> AccessState {
        self.lock_session().state()
    }

    /// Whether the combined predicate currently allows the application to
    /// run.
    pub fn is_usable(&self) -> bool {
        self.lock_session().status().usable()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }

    /// Forced remote refresh shared by poll ticks, focus events, and the
    /// REFRESH admin command.
    fn forced_refresh(&self) {
        let mut transitions = Vec::new();
        {
            let mut session = self.lock_session();
            let check = self.control.check_remote(true);
            self.apply_remote(&mut session, check);
            self.reevaluate(&mut session, &mut transitions);
            self.send_heartbeat(&session);
        }
        self.notify(&transitions);
    }

    /// Persist the local lock and block. The store write completes before
    /// the transition is observable.
    fn lock_locally(&self) {
        let mut transitions = Vec::new();
        {
            let mut session = self.lock_session();
            if let Err(e) = self.store.set_locked(true, self.clock.as_ref()) {
                tracing::error!("failed to persist local lock: {}", e);
            }
            session.status_mut().locally_locked = true;
            self.reevaluate(&mut session, &mut transitions);
            self.send_heartbeat(&session);
        }
        self.notify(&transitions);
    }

    /// Clear the local lock, grant the session geo bypass, and re-validate
    /// against the remote service before declaring success.
    fn unlock_locally(&self) {
        let mut transitions = Vec::new();
        {
            let mut session = self.lock_session();
            if let Err(e) = self.store.set_locked(false, self.clock.as_ref()) {
                tracing::error!("failed to clear persisted lock: {}", e);
            }
            session.status_mut().locally_locked = false;
            session.grant_geo_bypass();

            let check = self.control.check_remote(true);
            self.apply_remote(&mut session, check);
            self.reevaluate(&mut session, &mut transitions);
            self.send_heartbeat(&session);
        }
        self.notify(&transitions);
    }

    /// Fold a remote check into session state, applying force-allow side
    /// effects.
    fn apply_remote(&self, session: &mut SessionState, check: RemoteCheck) {
        if let Some(message) = check.message_override {
            session.set_shutdown_override(message);
        }

        if check.force_allow {
            if session.status().locally_locked {
                if let Err(e) = self.store.set_locked(false, self.clock.as_ref()) {
                    tracing::error!("failed to clear persisted lock: {}", e);
                }
                session.status_mut().locally_locked = false;
                tracing::info!("local lock cleared by force-allow window");
            }
            if !session.status().geo_bypass {
                session.grant_geo_bypass();
                tracing::info!("session geo bypass granted by force-allow window");
            }
        }

        session.status_mut().remote_pass = check.pass;
    }

    /// Derive the access state from the gate status and drive the overlay.
    ///
    /// The overlay call is repeated even when the state is unchanged so a
    /// runtime message override takes effect, and so re-blocking is
    /// idempotent.
    fn reevaluate(&self, session: &mut SessionState, transitions: &mut Vec<AccessState>) {
        match session.status().blocking_gate() {
            Some(Gate::LocalLock) => {
                self.set_state(session, transitions, AccessState::LocalLocked);
                self.overlay.show(session.shutdown_message(&self.config), true);
            }
            Some(Gate::Geo) => {
                self.set_state(session, transitions, AccessState::GeoBlocked);
                self.overlay.show(&self.config.region_message, true);
            }
            Some(Gate::Remote) => {
                self.set_state(session, transitions, AccessState::RemoteBlocked);
                self.overlay.show(session.shutdown_message(&self.config), true);
            }
            None => {
                self.set_state(session, transitions, AccessState::Allowed);
                self.overlay.hide();
            }
        }
    }

    fn set_state(
        &self,
        session: &mut SessionState,
        transitions: &mut Vec<AccessState>,
        state: AccessState,
    ) {
        if session.state() != state {
            tracing::info!(from = ?session.state(), to = ?state, "access state transition");
            session.set_state(state);
            transitions.push(state);
        }
    }

    /// Build and post a heartbeat reflecting the just-computed gate state.
    fn send_heartbeat(&self, session: &SessionState) {
        let status = if session.status().usable()
            && !self.overlay.is_visible()
            && session.state() == AccessState::Allowed
        {
            HeartbeatStatus::Live
        } else {
            HeartbeatStatus::Locked
        };

        let report = HeartbeatReport {
            device: self.config.device_id.clone(),
            platform: self.config.platform.clone(),
            version: self.config.app_version.clone(),
            status,
            ts_utc: self.clock.now_utc().to_rfc3339(),
        };

        self.control.send_heartbeat(&report);
    }

    fn notify(&self, transitions: &[AccessState]) {
        if transitions.is_empty() {
            return;
        }
        // Snapshot outside the iteration so a listener can register or drop
        // subscriptions without deadlocking.
        let snapshot: Vec<StateListener> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for state in transitions {
            for listener in &snapshot {
                listener(*state);
            }
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, SessionState> {
        // A poisoned session (listener or overlay panic) must not kill the
        // gate; the state it holds is still consistent.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn digest_matches(normalized: &str, configured: &str) -> bool {
    // Empty configured digests are permanently non-matching.
    !configured.is_empty() && constant_time_eq(normalized, &configured.to_ascii_lowercase())
}
