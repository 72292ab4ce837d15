//! Query execution module
//!
//! This module contains the predicate evaluator and the execution engine.

pub mod executor;
pub mod predicate;

pub use executor::{ExecutionEngine, InterruptHandle, QueryResult};
pub use predicate::CompiledPredicate;
