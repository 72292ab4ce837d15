//! Storage engine module
//!
//! This module contains the storage engine components:
//! - Row codec (CSV segment files)
//! - Segment store (numbering, rollover, rewrite)
//! - Table directories, primary key sequences and table locks

pub mod codec;
pub mod lock;
pub mod row;
pub mod segment;
pub mod sequence;
pub mod table;

pub use codec::SegmentData;
pub use lock::{LockMode, TableLock, TableLockGuard};
pub use row::Row;
pub use segment::{Segment, SegmentStore};
pub use sequence::PrimaryKeySequence;
pub use table::Table;
