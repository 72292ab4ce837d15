//! Per-table advisory lock
//!
//! Every table directory carries a `<table>_Lock` marker file. Mutating
//! operations hold an exclusive OS lock on it, reads hold a shared one.
//! The lock is released when the guard is dropped.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{trace, warn};

use crate::error::Result;

/// Lock marker of one table
#[derive(Debug, Clone)]
pub struct TableLock {
    path: PathBuf,
}

/// Lock flavour held by a [`TableLockGuard`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

impl TableLock {
    /// Create the marker file if it does not exist yet
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let lock = Self { path: path.into() };
        lock.open_file()?;
        Ok(lock)
    }

    /// Path of the marker file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until an exclusive lock is held
    pub fn exclusive(&self) -> Result<TableLockGuard> {
        let file = self.open_file()?;
        FileExt::lock_exclusive(&file)?;
        trace!(path = %self.path.display(), "acquired exclusive table lock");
        Ok(TableLockGuard {
            file,
            mode: LockMode::Exclusive,
        })
    }

    /// Block until a shared lock is held
    pub fn shared(&self) -> Result<TableLockGuard> {
        let file = self.open_file()?;
        FileExt::lock_shared(&file)?;
        trace!(path = %self.path.display(), "acquired shared table lock");
        Ok(TableLockGuard {
            file,
            mode: LockMode::Shared,
        })
    }

    fn open_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        Ok(file)
    }
}

/// Held table lock; unlocks on drop
#[derive(Debug)]
pub struct TableLockGuard {
    file: File,
    mode: LockMode,
}

impl TableLockGuard {
    /// Lock flavour held
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for TableLockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release table lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_marker_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users_Lock");

        let lock = TableLock::create(&path).unwrap();
        assert!(lock.path().exists());
    }

    #[test]
    fn test_exclusive_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock = TableLock::create(dir.path().join("users_Lock")).unwrap();

        {
            let guard = lock.exclusive().unwrap();
            assert_eq!(guard.mode(), LockMode::Exclusive);

            let other = OpenOptions::new().read(true).open(lock.path()).unwrap();
            assert!(FileExt::try_lock_shared(&other).is_err());
        }

        let other = OpenOptions::new().read(true).open(lock.path()).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
        FileExt::unlock(&other).unwrap();
    }

    #[test]
    fn test_shared_locks_coexist() {
        let dir = tempfile::tempdir().unwrap();
        let lock = TableLock::create(dir.path().join("users_Lock")).unwrap();

        let first = lock.shared().unwrap();
        let second = lock.shared().unwrap();
        assert_eq!(first.mode(), LockMode::Shared);
        assert_eq!(second.mode(), LockMode::Shared);
    }
}
