//! Persisted primary key sequence
//!
//! The sequence file holds the decimal text of the last key handed out.
//! Updates go through a temporary file and a rename so a crash never leaves
//! a half-written counter behind.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Monotonic per-table key generator
#[derive(Debug, Clone)]
pub struct PrimaryKeySequence {
    path: PathBuf,
}

impl PrimaryKeySequence {
    /// Open the sequence at `path`, creating it with `last_issued` if missing
    pub fn open_or_create(path: impl Into<PathBuf>, last_issued: u64) -> Result<Self> {
        let sequence = Self { path: path.into() };
        if !sequence.path.exists() {
            sequence.store(last_issued)?;
        }
        Ok(sequence)
    }

    /// Path of the sequence file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last key handed out (0 if none)
    pub fn current(&self) -> Result<u64> {
        let text = std::fs::read_to_string(&self.path)?;
        text.trim()
            .parse()
            .map_err(|_| Error::CorruptedSequence(self.path.display().to_string()))
    }

    /// Increment the counter and return the new key
    pub fn next_value(&self) -> Result<u64> {
        let next = self
            .current()?
            .checked_add(1)
            .ok_or_else(|| Error::CorruptedSequence(self.path.display().to_string()))?;
        self.store(next)?;
        Ok(next)
    }

    fn store(&self, value: u64) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, value.to_string())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
