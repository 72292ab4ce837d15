//! Table storage for FlatDB
//!
//! This module combines a table definition with its on-disk directory:
//!
//! ```text
//! <schema>/<table>/
//! ├─ 1.csv, 2.csv, ...      # segments
//! ├─ <table>_pk_sequence    # last issued primary key (primary key mode only)
//! └─ <table>_Lock           # advisory lock marker
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use super::lock::{TableLock, TableLockGuard};
use super::row::Row;
use super::segment::SegmentStore;
use super::sequence::PrimaryKeySequence;
use crate::catalog::TableDef;
use crate::error::Result;

/// A table combining schema and storage
#[derive(Debug)]
pub struct Table {
    /// Table definition (metadata)
    def: Arc<TableDef>,
    /// Segment files
    segments: SegmentStore,
    /// Primary key generator, present when the schema enables primary keys
    sequence: Option<PrimaryKeySequence>,
    /// Advisory lock marker
    lock: TableLock,
}

impl Table {
    /// Open a table under `schema_dir`, creating its directory, first
    /// segment, lock marker and key sequence as needed
    pub fn open(def: Arc<TableDef>, schema_dir: &Path, segment_row_limit: usize) -> Result<Self> {
        let dir = schema_dir.join(def.name());
        let segments = SegmentStore::new(def.name(), &dir, def.header(), segment_row_limit);
        segments.init()?;

        let lock = TableLock::create(dir.join(format!("{}_Lock", def.name())))?;

        let sequence = if def.has_primary_key() {
            let path = dir.join(format!("{}_pk_sequence", def.name()));
            let seed = if path.exists() {
                0
            } else {
                highest_primary_key(&segments)
            };
            Some(PrimaryKeySequence::open_or_create(path, seed)?)
        } else {
            None
        };

        debug!(table = %def.name(), dir = %dir.display(), "opened table");
        Ok(Self {
            def,
            segments,
            sequence,
            lock,
        })
    }

    /// Get table name
    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// Get table definition
    pub fn definition(&self) -> &TableDef {
        &self.def
    }

    /// Table directory
    pub fn dir(&self) -> PathBuf {
        self.segments.dir().to_path_buf()
    }

    /// Segment store of this table
    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    /// Take the exclusive lock (Insert/Delete)
    pub fn lock_exclusive(&self) -> Result<TableLockGuard> {
        self.lock.exclusive()
    }

    /// Take the shared lock (Select)
    pub fn lock_shared(&self) -> Result<TableLockGuard> {
        self.lock.shared()
    }

    /// Issue the next primary key, or `None` when keys are disabled
    pub fn next_primary_key(&self) -> Result<Option<u64>> {
        self.sequence.as_ref().map(|seq| seq.next_value()).transpose()
    }

    /// Append a row to the first segment with room, rolling over if needed
    pub fn append(&self, row: &Row) -> Result<u32> {
        let segment = self.segments.writable_segment()?;
        self.segments.append_row(&segment, row)?;
        Ok(segment.number)
    }
}

/// Largest key already stored, used to seed a missing sequence file so keys
/// are never handed out twice
fn highest_primary_key(segments: &SegmentStore) -> u64 {
    let Ok(list) = segments.list_segments() else {
        return 0;
    };

    let mut highest = 0;
    for segment in &list {
        match segments.read_segment(segment) {
            Ok(rows) => {
                for row in rows {
                    if let Some(key) = row.get(0).and_then(|f| f.trim().parse::<u64>().ok()) {
                        highest = highest.max(key);
                    }
                }
            }
            Err(e) => warn!(segment = segment.number, error = %e, "cannot scan segment for keys"),
        }
    }
    highest
}
