//! Gating policy: the combined access predicate and force-allow windows.

/// One of the three independent pass/fail checks, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Persisted local kill flag.
    LocalLock,
    /// Geographic allow-list.
    Geo,
    /// Remote kill-switch.
    Remote,
}

/// Last-known outcome of each gate plus the session geo bypass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStatus {
    /// Persisted local lock flag, mirrored from the store.
    pub locally_locked: bool,

    /// Result of the last geographic check.
    pub geo_pass: bool,

    /// One-way session flag substituting for a failed geographic check.
    pub geo_bypass: bool,

    /// Result of the last remote kill-switch check.
    pub remote_pass: bool,
}

impl GateStatus {
    /// The combined predicate: `(geo ∨ bypass) ∧ remote ∧ ¬lock`.
    pub fn usable(&self) -> bool {
        (self.geo_pass || self.geo_bypass) && self.remote_pass && !self.locally_locked
    }

    /// Highest-priority failing gate, or `None` when usable.
    ///
    /// Priority matches the startup sequence: local lock, then geo, then
    /// remote.
    pub fn blocking_gate(&self) -> Option<Gate> {
        if self.locally_locked {
            Some(Gate::LocalLock)
        } else if !(self.geo_pass || self.geo_bypass) {
            Some(Gate::Geo)
        } else if !self.remote_pass {
            Some(Gate::Remote)
        } else {
            None
        }
    }
}

/// Whether a server force-allow directive is currently in effect.
///
/// `force_until` absent or non-positive means no expiry; otherwise the
/// window is honored while `now <= force_until` (epoch seconds).
pub fn force_window_active(force_allow: bool, force_until: Option<i64>, now: i64) -> bool {
    if !force_allow {
        return false;
    }
    match force_until {
        None => true,
        Some(until) if until <= 0 => true,
        Some(until) => now <= until,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_pass() -> GateStatus {
        GateStatus {
            locally_locked: false,
            geo_pass: true,
            geo_bypass: false,
            remote_pass: true,
        }
    }

    #[test]
    fn test_usable_all_pass() {
        assert!(all_pass().usable());
        assert_eq!(all_pass().blocking_gate(), None);
    }

    #[test]
    fn test_local_lock_overrides_everything() {
        let status = GateStatus {
            locally_locked: true,
            geo_pass: true,
            geo_bypass: true,
            remote_pass: true,
        };
        assert!(!status.usable());
        assert_eq!(status.blocking_gate(), Some(Gate::LocalLock));
    }

    #[test]
    fn test_geo_fail_blocks() {
        let status = GateStatus {
            geo_pass: false,
            ..all_pass()
        };
        assert!(!status.usable());
        assert_eq!(status.blocking_gate(), Some(Gate::Geo));
    }

    #[test]
    fn test_bypass_substitutes_for_geo() {
        let status = GateStatus {
            geo_pass: false,
            geo_bypass: true,
            ..all_pass()
        };
        assert!(status.usable());
        assert_eq!(status.blocking_gate(), None);
    }

    #[test]
    fn test_remote_fail_blocks() {
        let status = GateStatus {
            remote_pass: false,
            ..all_pass()
        };
        assert!(!status.usable());
        assert_eq!(status.blocking_gate(), Some(Gate::Remote));
    }

    #[test]
    fn test_gate_priority_ordering() {
        let status = GateStatus {
            locally_locked: true,
            geo_pass: false,
            geo_bypass: false,
            remote_pass: false,
        };
        assert_eq!(status.blocking_gate(), Some(Gate::LocalLock));

        let status = GateStatus {
            locally_locked: false,
            ..status
        };
        assert_eq!(status.blocking_gate(), Some(Gate::Geo));

        let status = GateStatus {
            geo_pass: true,
            ..status
        };
        assert_eq!(status.blocking_gate(), Some(Gate::Remote));
    }

    #[test]
    fn test_force_window_flag_off() {
        assert!(!force_window_active(false, None, 1000));
        assert!(!force_window_active(false, Some(2000), 1000));
    }

    #[test]
    fn test_force_window_no_expiry() {
        assert!(force_window_active(true, None, 1000));
        assert!(force_window_active(true, Some(0), 1000));
        assert!(force_window_active(true, Some(-5), 1000));
    }

    #[test]
    fn test_force_window_expiry_boundaries() {
        // One second before the deadline: granted.
        assert!(force_window_active(true, Some(1000), 999));
        // Exactly at the deadline: granted.
        assert!(force_window_active(true, Some(1000), 1000));
        // One second past the deadline: denied.
        assert!(!force_window_active(true, Some(1000), 1001));
    }
}
