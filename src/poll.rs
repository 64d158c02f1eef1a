//! Background poll loop.
//!
//! A dedicated worker thread drives [`Gatekeeper::poll_tick`] at the
//! configured interval for the life of the process. The loop never exits on
//! failing ticks; it stops only when the handle is stopped or dropped.

use crate::manager::Gatekeeper;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Handle for the background poll worker.
///
/// Dropping the handle stops the worker and joins it, so no tick can fire
/// after teardown.
pub struct PollLoop {
    stop: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl PollLoop {
    /// Spawn the poll worker for `gate`.
    ///
    /// Start this in every startup outcome: a blocked application self-heals
    /// (or escalates) through subsequent ticks without a restart.
    pub fn start(gate: Arc<Gatekeeper>) -> Self {
        let interval = gate.config().poll_interval();
        let (stop, stop_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            tracing::debug!(interval_secs = interval.as_secs(), "poll loop started");
            loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => gate.poll_tick(),
                }
            }
            tracing::debug!("poll loop stopped");
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ControlPlane, GeoCheck, RemoteCheck};
    use crate::clock::MockClock;
    use crate::config::GatekeeperConfig;
    use crate::overlay::{OverlayGate, RecordingOverlay};
    use crate::protocol::models::HeartbeatReport;
    use crate::store::file::FileLockStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingControl {
        remote_calls: AtomicUsize,
    }

    impl ControlPlane for CountingControl {
        fn check_geo(&self) -> GeoCheck {
            GeoCheck {
                pass: true,
                country: None,
            }
        }

        fn check_remote(&self, _forced: bool) -> RemoteCheck {
            self.remote_calls.fetch_add(1, Ordering::SeqCst);
            RemoteCheck::passing()
        }

        fn send_heartbeat(&self, _report: &HeartbeatReport) {}
    }

    #[test]
    fn test_poll_loop_ticks_then_stops() {
        let dir = TempDir::new().unwrap();
        let control = Arc::new(CountingControl::default());
        let config = GatekeeperConfig {
            poll_interval_secs: 1,
            ..Default::default()
        };
        let gate = Arc::new(
            Gatekeeper::with_parts(
                config,
                Arc::new(RecordingOverlay::new()) as Arc<dyn OverlayGate>,
                Arc::clone(&control) as Arc<dyn ControlPlane>,
                FileLockStore::with_path(dir.path().to_path_buf()).unwrap(),
                Arc::new(MockClock::from_rfc3339("2025-01-15T12:00:00Z")),
            )
            .unwrap(),
        );

        let poll = PollLoop::start(Arc::clone(&gate));
        thread::sleep(Duration::from_millis(2500));
        poll.stop();

        let ticks = control.remote_calls.load(Ordering::SeqCst);
        assert!(ticks >= 1, "expected at least one tick, got {}", ticks);

        // No ticks after stop.
        thread::sleep(Duration::from_millis(1500));
        assert_eq!(control.remote_calls.load(Ordering::SeqCst), ticks);
    }
}
