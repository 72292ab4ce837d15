//! Segment store for FlatDB
//!
//! Each table keeps its rows in numbered segment files (`1.csv`, `2.csv`,
//! ...) inside the table directory. The store never caches the segment
//! list: every call rescans the directory, so segments added or removed by
//! hand are picked up and files whose names do not parse are ignored.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::codec;
use super::row::Row;
use crate::error::{Error, Result};

/// Segment file extension
pub const SEGMENT_EXTENSION: &str = "csv";

/// One data file of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Segment number, taken from the file name
    pub number: u32,
    /// Path to the segment file
    pub path: PathBuf,
}

impl Segment {
    /// File name of segment `number`
    pub fn file_name(number: u32) -> String {
        format!("{}.{}", number, SEGMENT_EXTENSION)
    }

    /// Parses a segment number from a file path.
    ///
    /// Only canonical names are accepted: `7.csv` parses, `07.csv`, `+7.csv`
    /// and `seven.csv` do not.
    pub fn parse_number(path: &Path) -> Option<u32> {
        if path.extension()? != SEGMENT_EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        let number: u32 = stem.parse().ok()?;
        (number.to_string() == stem).then_some(number)
    }
}

/// Manages the segment files of one table
#[derive(Debug, Clone)]
pub struct SegmentStore {
    /// Owning table (for diagnostics)
    table: String,
    /// Table directory
    dir: PathBuf,
    /// Header row written to every segment
    header: Vec<String>,
    /// Maximum data rows per segment
    row_limit: usize,
}

impl SegmentStore {
    /// Create a store for the segments in `dir`
    pub fn new(
        table: impl Into<String>,
        dir: impl Into<PathBuf>,
        header: Vec<String>,
        row_limit: usize,
    ) -> Self {
        Self {
            table: table.into(),
            dir: dir.into(),
            header,
            row_limit,
        }
    }

    /// Table directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Header row of every segment
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Maximum data rows per segment
    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    /// Create the table directory and segment 1 if the table has no segment yet
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        if self.list_segments()?.is_empty() {
            self.create_segment(1)?;
        }
        Ok(())
    }

    /// List all segments in ascending number order
    pub fn list_segments(&self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            match Segment::parse_number(&path) {
                Some(number) => segments.push(Segment { number, path }),
                None => debug!(table = %self.table, path = %path.display(), "ignoring non-segment file"),
            }
        }

        segments.sort_by_key(|s| s.number);
        Ok(segments)
    }

    /// Find the first segment with room for another row, creating a new one
    /// when every existing segment is full
    pub fn writable_segment(&self) -> Result<Segment> {
        let segments = self.list_segments()?;

        for segment in &segments {
            match self.read_segment(segment) {
                Ok(rows) if rows.len() < self.row_limit => return Ok(segment.clone()),
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        table = %self.table,
                        segment = segment.number,
                        error = %e,
                        "skipping unreadable segment"
                    );
                }
            }
        }

        let number = match segments.last() {
            Some(last) => last.number.checked_add(1).ok_or_else(|| {
                Error::malformed_segment(&last.path, "segment numbers exhausted")
            })?,
            None => 1,
        };
        let segment = self.create_segment(number)?;
        info!(table = %self.table, segment = number, "rolled over to new segment");
        Ok(segment)
    }

    /// Read the data rows of a segment, checking its header
    pub fn read_segment(&self, segment: &Segment) -> Result<Vec<Row>> {
        let data = codec::read_all(&segment.path)?;
        if data.header != self.header {
            return Err(Error::malformed_segment(
                &segment.path,
                format!(
                    "header [{}] does not match [{}]",
                    data.header.join(", "),
                    self.header.join(", ")
                ),
            ));
        }
        Ok(data.rows)
    }

    /// Append a row to a segment obtained from [`writable_segment`](Self::writable_segment)
    pub fn append_row(&self, segment: &Segment, row: &Row) -> Result<()> {
        codec::append_row(&segment.path, row)
    }

    /// Replace a segment's content with the header followed by `rows`.
    ///
    /// The rewrite is not atomic: a failure part way leaves a truncated file.
    pub fn rewrite_segment(&self, segment: &Segment, rows: &[Row]) -> Result<()> {
        codec::write_all(&segment.path, &self.header, rows)
    }

    fn create_segment(&self, number: u32) -> Result<Segment> {
        let path = self.dir.join(Segment::file_name(number));
        codec::write_all(&path, &self.header, &[])?;
        debug!(table = %self.table, segment = number, "created segment");
        Ok(Segment { number, path })
    }
}
