//! Row type for FlatDB
//!
//! A row is an ordered sequence of string fields. There is no type system
//! beyond strings; comparisons are exact after trimming.

use serde::Serialize;
use std::fmt;

/// A stored or projected row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Row {
    fields: Vec<String>,
}

impl Row {
    /// Create a new row from its fields
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// Get all fields
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Get a field by index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume the row, returning its fields
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Prepend a field (used for the synthetic primary key)
    pub fn prepend(&mut self, field: impl Into<String>) {
        self.fields.insert(0, field.into());
    }

    /// Does the field at `index`, trimmed, equal `value`?
    ///
    /// A missing field never matches.
    pub fn field_equals(&self, index: usize, value: &str) -> bool {
        self.get(index).is_some_and(|field| field.trim() == value)
    }

    /// Build a new row from the fields at `indexes`, in that order
    pub fn project(&self, indexes: &[usize]) -> Row {
        Row::new(
            indexes
                .iter()
                .map(|&idx| self.fields.get(idx).cloned().unwrap_or_default())
                .collect(),
        )
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Row::new(fields)
    }
}

impl From<Vec<&str>> for Row {
    fn from(fields: Vec<&str>) -> Self {
        Row::new(fields.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.join(", "))
    }
}
