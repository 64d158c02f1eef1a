//! Blocking-overlay contract.
//!
//! The state machine consumes this trait; the host application implements it
//! over its actual UI. The overlay must forward submitted code strings
//! verbatim to [`crate::manager::Gatekeeper::submit_code`] without
//! pre-normalizing or hashing them.

#[cfg(any(test, feature = "test-seams"))]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(any(test, feature = "test-seams"))]
use std::sync::Mutex;

/// Presentation-agnostic block screen.
///
/// Implementations must not call back into the gate synchronously from
/// `show`/`hide`; they are invoked while the gate's session lock is held.
pub trait OverlayGate: Send + Sync {
    /// Reveal the block screen with `message`; `admin_mode` also reveals the
    /// admin-code input and submit affordance.
    fn show(&self, message: &str, admin_mode: bool);

    /// Conceal the block screen.
    fn hide(&self);

    /// Whether the block screen is currently shown. Used by the heartbeat
    /// status computation and by collaborators suppressing input.
    fn is_visible(&self) -> bool;
}

/// Recording overlay double for tests and host integration tests.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug, Default)]
pub struct RecordingOverlay {
    visible: AtomicBool,
    shown: Mutex<Vec<(String, bool)>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl RecordingOverlay {
    /// Create a hidden recording overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(message, admin_mode)` pair passed to `show`, in order.
    pub fn shown(&self) -> Vec<(String, bool)> {
        self.shown.lock().expect("overlay mutex poisoned").clone()
    }

    /// The most recent message passed to `show`.
    pub fn last_message(&self) -> Option<String> {
        self.shown
            .lock()
            .expect("overlay mutex poisoned")
            .last()
            .map(|(message, _)| message.clone())
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl OverlayGate for RecordingOverlay {
    fn show(&self, message: &str, admin_mode: bool) {
        self.visible.store(true, Ordering::SeqCst);
        self.shown
            .lock()
            .expect("overlay mutex poisoned")
            .push((message.to_string(), admin_mode));
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}
