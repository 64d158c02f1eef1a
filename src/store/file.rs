//! File-backed lock store with durable atomic writes.
//!
//! The flag lives under `dirs::data_dir()/<namespace>/lock.json`. Writes go
//! through a temp file that is fsynced before the atomic rename, so the flag
//! is durable before any dependent state transition is observed.

use crate::clock::Clock;
use crate::store::format::LockRecord;
use crate::GatekeeperError;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const LOCK_FILE: &str = "lock.json";

/// File-backed store for the persisted local lock flag.
pub struct FileLockStore {
    store_dir: PathBuf,
}

impl FileLockStore {
    /// Create a lock store under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, GatekeeperError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| GatekeeperError::StoreIO("Could not find data directory".to_string()))?;

        let store_dir = base_dir.join(namespace);

        fs::create_dir_all(&store_dir)
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to create store dir: {}", e)))?;

        Ok(Self { store_dir })
    }

    /// Create a lock store at a specific path (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_path(store_dir: PathBuf) -> Result<Self, GatekeeperError> {
        fs::create_dir_all(&store_dir)
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to create store dir: {}", e)))?;
        Ok(Self { store_dir })
    }

    fn lock_path(&self) -> PathBuf {
        self.store_dir.join(LOCK_FILE)
    }

    /// Read the persisted flag. Missing or unreadable records default to
    /// unlocked; corruption is logged, never propagated.
    pub fn is_locked(&self) -> bool {
        let path = self.lock_path();

        if !path.exists() {
            return false;
        }

        match fs::read_to_string(&path) {
            Ok(json) => match LockRecord::from_json(&json) {
                Ok(record) => record.locked,
                Err(e) => {
                    tracing::warn!("corrupt lock record treated as unlocked: {}", e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("unreadable lock record treated as unlocked: {}", e);
                false
            }
        }
    }

    /// Write and durably flush the flag.
    ///
    /// Returns only after the record is synced and renamed into place.
    pub fn set_locked(&self, locked: bool, clock: &dyn Clock) -> Result<(), GatekeeperError> {
        let target_path = self.lock_path();
        let temp_path = self.store_dir.join(format!("{}.tmp", LOCK_FILE));

        let json = LockRecord::new(locked, clock).to_json()?;

        let mut file = fs::File::create(&temp_path)
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to create temp file: {}", e)))?;
        file.write_all(json.as_bytes())
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to write temp file: {}", e)))?;
        file.sync_all()
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to sync temp file: {}", e)))?;

        fs::rename(&temp_path, &target_path)
            .map_err(|e| GatekeeperError::StoreIO(format!("Failed to rename lock file: {}", e)))?;

        Ok(())
    }
}
