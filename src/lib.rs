//! # Gatekeeper
//!
//! **Remote-enforced access gating for Rust applications.**
//!
//! Gatekeeper decides, at startup and continuously, whether the surrounding
//! application is permitted to run. Three independent gates feed one
//! predicate:
//!
//! - **Local lock** — a persisted kill flag surviving restarts
//! - **Geographic allow-list** — a geo-IP lookup against configured country
//!   codes, with optional locale/timezone allow hints
//! - **Remote kill-switch** — a polled control endpoint with fail-open or
//!   fail-closed policy, runtime message overrides, and time-bounded
//!   force-allow windows
//!
//! The application is usable iff `(geo ∨ session bypass) ∧ remote ∧ ¬lock`.
//! A blocking overlay (implemented by the host, consumed through
//! [`OverlayGate`]) shows the block screen and collects admin codes; a
//! background [`PollLoop`] re-checks the remote service and reports a
//! heartbeat each tick, so a blocked application can self-heal — or be shut
//! down — without a restart.
//!
//! ## Quickstart
//!
//! ```no_run
//! use gatekeeper::{AccessState, Gatekeeper, GatekeeperConfig, OverlayGate, PollLoop};
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct ConsoleOverlay {
//!     visible: AtomicBool,
//! }
//!
//! impl OverlayGate for ConsoleOverlay {
//!     fn show(&self, message: &str, _admin_mode: bool) {
//!         self.visible.store(true, Ordering::SeqCst);
//!         eprintln!("BLOCKED: {message}");
//!     }
//!     fn hide(&self) {
//!         self.visible.store(false, Ordering::SeqCst);
//!     }
//!     fn is_visible(&self) -> bool {
//!         self.visible.load(Ordering::SeqCst)
//!     }
//! }
//!
//! fn main() -> Result<(), gatekeeper::GatekeeperError> {
//!     let config = GatekeeperConfig {
//!         allowed_countries: vec!["EG".to_string()],
//!         geo_url: "https://geo.example.com/lookup".to_string(),
//!         remote_url: "https://control.example.com/gate".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let gate = Arc::new(Gatekeeper::new(config, Arc::new(ConsoleOverlay::default()))?);
//!     let state = gate.startup();
//!     let _poll = PollLoop::start(Arc::clone(&gate));
//!
//!     if state == AccessState::Allowed {
//!         // run the application
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Threat Model
//!
//! Admin codes are compared as SHA-256 hex digests in constant time; they
//! are not signed tokens. Gatekeeper raises the cost of casual bypass, but
//! a user who controls the binary and local storage can always defeat
//! client-side gating.
//!
//! ## Failure Policy
//!
//! Network failures are never fatal: an unreachable kill-switch resolves per
//! the configured fail-open/fail-closed policy, an undeterminable geo check
//! fails (optionally rescued by allow-only hints), and the poll loop runs
//! indefinitely regardless of how many consecutive ticks fail. See
//! [`GatekeeperConfig`] for the full configuration surface.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Store layer
pub mod store;

// Policy layer
pub mod policy;

// Session state
pub mod session;

// Overlay contract
pub mod overlay;

// Manager (main public API)
pub mod manager;

// Background loop
pub mod poll;

// Re-exports for public API
pub use client::{ControlPlane, GeoCheck, RemoteCheck};
pub use clock::{Clock, SystemClock};
pub use config::GatekeeperConfig;
pub use errors::GatekeeperError;
pub use manager::{Gatekeeper, StateSubscription};
pub use overlay::OverlayGate;
pub use policy::access::{Gate, GateStatus};
pub use poll::PollLoop;
pub use protocol::models::{HeartbeatReport, HeartbeatStatus, RemoteControlResponse};
pub use session::AccessState;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-seams"))]
pub use overlay::RecordingOverlay;
