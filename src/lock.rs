//! Serialization of concurrent invocations
//!
//! Two keyboards plugged in together make the hotplug handler start two
//! runs at once. Holding an exclusive flock for the duration of a run makes
//! them apply one after the other.

use std::fs::{File, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use nix::fcntl::{Flock, FlockArg};

/// Exclusive lock held until dropped
pub struct InvocationLock {
    _lock: Flock<File>,
}

impl InvocationLock {
    /// Block until the lock at `path` is ours, creating the file if needed
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;

        let lock = Flock::lock(file, FlockArg::LockExclusive)
            .map_err(|(_, errno)| errno)
            .with_context(|| format!("Failed to lock {}", path.display()))?;

        log::debug!("Acquired lock {}", path.display());
        Ok(Self { _lock: lock })
    }

    /// Try to take the lock; on failure log and carry on unserialized
    pub fn acquire_or_warn(path: &Path) -> Option<Self> {
        match Self::acquire(path) {
            Ok(lock) => Some(lock),
            Err(e) => {
                log::warn!("{:#}; continuing without serialization", e);
                None
            }
        }
    }
}
