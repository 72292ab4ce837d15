//! WHERE predicate evaluation
//!
//! A [`Predicate`] is compiled against one table: every column reference is
//! resolved to a stored row index and every literal is normalised once, so
//! matching a row is plain string comparison.

use crate::catalog::TableDef;
use crate::error::{Error, Result};
use crate::sql::ast::{ColumnRef, Condition, Predicate};
use crate::storage::Row;

/// A predicate bound to the column layout of one table
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    /// Conjunction of disjunctions of (row index, expected value)
    terms: Vec<Vec<(usize, String)>>,
}

impl CompiledPredicate {
    /// Resolve `predicate` against `table`
    ///
    /// Fails with `ColumnNotFound` for a column the table does not have
    /// (including a column qualified with another table's name) and with
    /// `MalformedPredicate` for a term that is not `column = value`.
    pub fn compile(table: &TableDef, predicate: &Predicate) -> Result<Self> {
        let mut terms = Vec::with_capacity(predicate.terms.len());

        for term in &predicate.terms {
            let mut alternatives = Vec::with_capacity(term.alternatives.len());
            for condition in &term.alternatives {
                match condition {
                    Condition::Equals {
                        column,
                        value,
                        quoted,
                    } => {
                        let index = resolve(table, column)?;
                        let expected = if *quoted {
                            value.trim().to_string()
                        } else {
                            normalize_literal(value)
                        };
                        alternatives.push((index, expected));
                    }
                    Condition::Malformed(text) => {
                        return Err(Error::MalformedPredicate(text.clone()));
                    }
                }
            }
            terms.push(alternatives);
        }

        Ok(Self { terms })
    }

    /// Does `row` satisfy every term?
    pub fn matches(&self, row: &Row) -> bool {
        self.terms.iter().all(|alternatives| {
            alternatives
                .iter()
                .any(|(index, value)| row.field_equals(*index, value))
        })
    }
}

fn resolve(table: &TableDef, column: &ColumnRef) -> Result<usize> {
    if !column.applies_to(table.name()) {
        return Err(Error::ColumnNotFound(
            column.to_string(),
            table.name().to_string(),
        ));
    }
    table.require_column(&column.column)
}

/// Trim raw literal text and strip one pair of surrounding quotes
pub fn normalize_literal(value: &str) -> String {
    let trimmed = value.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].trim().to_string();
        }
    }
    trimmed.to_string()
}
