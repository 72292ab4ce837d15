//! Schema definitions for FlatDB
//!
//! This module defines the schema file model and per-table column metadata.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};

/// Suffix appended to a table name to form its synthetic primary key column
pub const PK_COLUMN_SUFFIX: &str = "_pk";

/// Database schema as stored in the schema file
///
/// ```json
/// {
///   "name": "shop",
///   "tuples_limit": 1000,
///   "structure": { "users": ["id", "name", "status"] },
///   "primary_key": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name, also the name of the data directory
    pub name: String,
    /// Maximum number of data rows per segment
    #[serde(rename = "tuples_limit")]
    pub segment_row_limit: usize,
    /// Table name to ordered column list, in declaration order
    pub structure: IndexMap<String, Vec<String>>,
    /// Prepend an engine-assigned primary key to every stored row
    #[serde(default)]
    pub primary_key: bool,
}

impl Schema {
    /// Parse a schema from its JSON text
    ///
    /// Only the JSON shape is checked here; structural rules are checked by
    /// [`validate`](Self::validate) when a catalog is built.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSchema(e.to_string()))
    }

    /// Check the structural rules the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidSchema("schema name is empty".to_string()));
        }
        if self.segment_row_limit == 0 {
            return Err(Error::InvalidSchema(
                "tuples_limit must be greater than zero".to_string(),
            ));
        }
        if self.structure.is_empty() {
            return Err(Error::InvalidSchema("schema declares no tables".to_string()));
        }

        for (table, columns) in &self.structure {
            if !is_plain_name(table) {
                return Err(Error::InvalidSchema(format!(
                    "invalid table name '{}'",
                    table
                )));
            }
            if columns.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "table '{}' has no columns",
                    table
                )));
            }

            let mut seen = HashSet::new();
            for column in columns {
                if column.trim().is_empty() {
                    return Err(Error::InvalidSchema(format!(
                        "table '{}' has an empty column name",
                        table
                    )));
                }
                if !seen.insert(column.as_str()) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate column '{}' in table '{}'",
                        column, table
                    )));
                }
                if self.primary_key && *column == primary_key_column(table) {
                    return Err(Error::InvalidSchema(format!(
                        "column '{}' clashes with the primary key of table '{}'",
                        column, table
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Table and column names end up as directory names and CSV headers
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_whitespace)
}

/// Name of the synthetic primary key column of `table`
pub fn primary_key_column(table: &str) -> String {
    format!("{}{}", table, PK_COLUMN_SUFFIX)
}

/// Table definition - the column contract of one table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    /// Table name
    name: String,
    /// User-visible columns in schema order
    columns: Vec<String>,
    /// Column name to schema index mapping
    name_to_index: HashMap<String, usize>,
    /// Whether stored rows carry a synthetic primary key in column 0
    primary_key: bool,
}

impl TableDef {
    /// Create a new table definition
    pub fn new(name: impl Into<String>, columns: Vec<String>, primary_key: bool) -> Self {
        let name_to_index = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| (col.clone(), idx))
            .collect();

        Self {
            name: name.into(),
            columns,
            name_to_index,
            primary_key,
        }
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the user-visible columns
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get number of user-visible columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if a user-visible column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get the schema index of a user-visible column
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Does this table use a synthetic primary key?
    pub fn has_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Name of the synthetic primary key column, if any
    pub fn primary_key_column(&self) -> Option<String> {
        self.primary_key.then(|| primary_key_column(&self.name))
    }

    /// Resolve a column name to its index in a stored row.
    ///
    /// User columns are shifted by one when the primary key occupies
    /// column 0; the primary key itself resolves to 0.
    pub fn resolve_column(&self, name: &str) -> Option<usize> {
        let offset = usize::from(self.primary_key);
        if let Some(idx) = self.get_column_index(name) {
            return Some(idx + offset);
        }
        if self.primary_key && name == primary_key_column(&self.name) {
            return Some(0);
        }
        None
    }

    /// Same as [`resolve_column`](Self::resolve_column) but reports unknown columns
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.resolve_column(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string(), self.name.clone()))
    }

    /// Stored row indexes of the user columns, in schema order
    pub fn user_column_indexes(&self) -> Vec<usize> {
        let offset = usize::from(self.primary_key);
        (0..self.columns.len()).map(|idx| idx + offset).collect()
    }

    /// Header row written at the top of every segment
    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.columns.len() + 1);
        if let Some(pk) = self.primary_key_column() {
            header.push(pk);
        }
        header.extend(self.columns.iter().cloned());
        header
    }
}
