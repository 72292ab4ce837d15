//! Row codec for FlatDB
//!
//! Segments are comma-separated text files. The first record of every
//! segment is the header; each following record is one row. Fields that
//! contain the separator, a quote, a line break, or leading whitespace are
//! wrapped in double quotes with embedded quotes doubled. This module is
//! the only place that knows the quoting rules.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::row::Row;
use crate::error::{Error, Result};

/// Field separator
pub const FIELD_SEPARATOR: char = ',';

const QUOTE: char = '"';

/// Decoded segment content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentData {
    /// Column names from the first record
    pub header: Vec<String>,
    /// Data rows, each with exactly `header.len()` fields
    pub rows: Vec<Row>,
}

/// Read and decode a whole segment
pub fn read_all(path: &Path) -> Result<SegmentData> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::malformed_segment(path, format!("unreadable: {}", e)))?;

    let mut records = decode_records(&text)
        .map_err(|reason| Error::malformed_segment(path, reason))?
        .into_iter();

    let header = records
        .next()
        .ok_or_else(|| Error::malformed_segment(path, "missing header row"))?;

    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        if record.len() != header.len() {
            return Err(Error::malformed_segment(
                path,
                format!(
                    "row {} has {} fields, header has {}",
                    idx + 1,
                    record.len(),
                    header.len()
                ),
            ));
        }
        rows.push(Row::new(record));
    }

    Ok(SegmentData { header, rows })
}

/// Replace the content of a segment with `header` followed by `rows`
pub fn write_all(path: &Path, header: &[String], rows: &[Row]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(encode_record(header).as_bytes())?;
    for row in rows {
        writer.write_all(encode_record(row.fields()).as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Append one row to an existing segment
pub fn append_row(path: &Path, row: &Row) -> Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(encode_record(row.fields()).as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Encode one record, including the trailing newline
pub fn encode_record(fields: &[String]) -> String {
    let mut line = String::new();

    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            line.push(FIELD_SEPARATOR);
        }
        // A lone empty field would otherwise be written as a blank line
        if needs_quotes(field) || (fields.len() == 1 && field.is_empty()) {
            line.push(QUOTE);
            line.push_str(&field.replace(QUOTE, "\"\""));
            line.push(QUOTE);
        } else {
            line.push_str(field);
        }
    }

    line.push('\n');
    line
}

fn needs_quotes(field: &str) -> bool {
    field.contains([FIELD_SEPARATOR, QUOTE, '\r', '\n'])
        || field.starts_with(char::is_whitespace)
}

/// Decode all records in `text`. Blank lines are skipped.
///
/// Returns a human-readable reason on malformed quoting.
pub fn decode_records(text: &str) -> std::result::Result<Vec<Vec<String>>, String> {
    let mut records = Vec::new();
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(&first) = chars.peek() {
        if first == '\n' || first == '\r' {
            chars.next();
            if first == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            line += 1;
            continue;
        }

        let record_line = line;
        let mut record = Vec::new();

        loop {
            let mut field = String::new();

            if chars.peek() == Some(&QUOTE) {
                chars.next();
                loop {
                    match chars.next() {
                        None => {
                            return Err(format!(
                                "line {}: unterminated quoted field",
                                record_line
                            ))
                        }
                        Some(QUOTE) if chars.peek() == Some(&QUOTE) => {
                            chars.next();
                            field.push(QUOTE);
                        }
                        Some(QUOTE) => break,
                        Some(ch) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            field.push(ch);
                        }
                    }
                }
                match chars.peek() {
                    None | Some(&FIELD_SEPARATOR) | Some(&'\n') | Some(&'\r') => {}
                    Some(_) => {
                        return Err(format!(
                            "line {}: extraneous character after quoted field",
                            line
                        ))
                    }
                }
            } else {
                while let Some(&ch) = chars.peek() {
                    if ch == FIELD_SEPARATOR || ch == '\n' || ch == '\r' {
                        break;
                    }
                    if ch == QUOTE {
                        return Err(format!("line {}: bare quote in unquoted field", line));
                    }
                    field.push(ch);
                    chars.next();
                }
            }

            record.push(field);

            match chars.next() {
                Some(FIELD_SEPARATOR) => continue,
                Some('\r') => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    line += 1;
                    break;
                }
                Some('\n') => {
                    line += 1;
                    break;
                }
                _ => break,
            }
        }

        records.push(record);
    }

    Ok(records)
}
