//! Command Abstract Syntax Tree (AST)
//!
//! This module defines the typed commands consumed by the query engine.

use std::fmt;

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// INSERT command
    Insert(InsertCommand),
    /// SELECT command
    Select(SelectCommand),
    /// DELETE command
    Delete(DeleteCommand),
}

/// INSERT command
#[derive(Debug, Clone, PartialEq)]
pub struct InsertCommand {
    /// Target table
    pub table_name: String,
    /// One value per user column, in schema order
    pub values: Vec<String>,
}

/// SELECT command
#[derive(Debug, Clone, PartialEq)]
pub struct SelectCommand {
    /// Projection list
    pub columns: Vec<SelectItem>,
    /// Tables scanned, in order
    pub tables: Vec<String>,
    /// WHERE clause
    pub predicate: Option<Predicate>,
}

/// DELETE command
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCommand {
    /// Target table
    pub table_name: String,
    /// WHERE clause (mandatory)
    pub predicate: Predicate,
}

/// A single item in the SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// All user columns (*)
    Wildcard,
    /// A named column
    Column(ColumnRef),
}

/// Column reference, optionally qualified with a table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// Unqualified column reference
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// `table.column` reference
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// Whether this reference may apply to rows of `table`
    pub fn applies_to(&self, table: &str) -> bool {
        self.table.as_deref().map_or(true, |t| t == table)
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        match s.split_once('.') {
            Some((table, column)) => ColumnRef::qualified(table, column),
            None => ColumnRef::new(s),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// WHERE clause: every term must hold
///
/// `(A = x OR A = y) AND B = z` is two terms, the first with two
/// alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub terms: Vec<Disjunction>,
}

impl Predicate {
    /// Predicate with a single `column = value` term
    pub fn equals(column: impl Into<ColumnRef>, value: impl Into<String>) -> Self {
        Self {
            terms: vec![Disjunction::single(Condition::equals(column, value))],
        }
    }

    /// Add another conjunct
    pub fn and(mut self, term: Disjunction) -> Self {
        self.terms.push(term);
        self
    }

    /// Add a `column = value` conjunct
    pub fn and_equals(self, column: impl Into<ColumnRef>, value: impl Into<String>) -> Self {
        self.and(Disjunction::single(Condition::equals(column, value)))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            if term.alternatives.len() > 1 && self.terms.len() > 1 {
                write!(f, "({})", term)?;
            } else {
                write!(f, "{}", term)?;
            }
        }
        Ok(())
    }
}

/// A term: at least one alternative must hold
#[derive(Debug, Clone, PartialEq)]
pub struct Disjunction {
    pub alternatives: Vec<Condition>,
}

impl Disjunction {
    pub fn single(condition: Condition) -> Self {
        Self {
            alternatives: vec![condition],
        }
    }

    /// Term holding when any of the given conditions holds
    pub fn any(alternatives: Vec<Condition>) -> Self {
        Self { alternatives }
    }
}

impl fmt::Display for Disjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, alt) in self.alternatives.iter().enumerate() {
            if i > 0 {
                write!(f, " OR ")?;
            }
            write!(f, "{}", alt)?;
        }
        Ok(())
    }
}

/// A single alternative
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    ///
    /// `quoted` is set when `value` came from a string literal and is
    /// already unquoted; otherwise `value` is raw text whose surrounding
    /// quotes are still to be stripped.
    Equals {
        column: ColumnRef,
        value: String,
        quoted: bool,
    },
    /// Text of a term that is not of the form `column = value`
    Malformed(String),
}

impl Condition {
    /// `column = value` with `value` as raw literal text
    pub fn equals(column: impl Into<ColumnRef>, value: impl Into<String>) -> Self {
        Condition::Equals {
            column: column.into(),
            value: value.into(),
            quoted: false,
        }
    }

    /// `column = value` with `value` taken verbatim
    pub fn quoted(column: impl Into<ColumnRef>, value: impl Into<String>) -> Self {
        Condition::Equals {
            column: column.into(),
            value: value.into(),
            quoted: true,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals {
                column,
                value,
                quoted: true,
            } => write!(f, "{} = '{}'", column, value.replace('\'', "''")),
            Condition::Equals { column, value, .. } => write!(f, "{} = {}", column, value),
            Condition::Malformed(text) => write!(f, "{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_ref_from_str() {
        assert_eq!(ColumnRef::from("name"), ColumnRef::new("name"));
        assert_eq!(
            ColumnRef::from("users.name"),
            ColumnRef::qualified("users", "name")
        );
        assert!(ColumnRef::from("users.name").applies_to("users"));
        assert!(!ColumnRef::from("users.name").applies_to("orders"));
        assert!(ColumnRef::new("name").applies_to("orders"));
    }

    #[test]
    fn test_predicate_display() {
        let pred = Predicate {
            terms: vec![Disjunction::any(vec![
                Condition::quoted("status", "it's"),
                Condition::equals("status", "b"),
            ])],
        }
        .and_equals("id", "3");

        assert_eq!(
            pred.to_string(),
            "(status = 'it''s' OR status = b) AND id = 3"
        );
    }
}
