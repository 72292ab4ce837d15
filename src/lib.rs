//! FlatDB - A file-backed tabular store written in Rust
//!
//! This library provides the components of a minimal table store:
//! - Schema model (JSON schema file, table definitions)
//! - Storage engine (CSV segments, primary key sequences, table locks)
//! - Command parsing (lexer, parser, AST)
//! - Query execution (predicate evaluation, INSERT / SELECT / DELETE)

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use error::{Error, ErrorKind, Result};
