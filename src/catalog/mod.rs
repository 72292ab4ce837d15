//! Catalog module
//!
//! This module contains the schema model and the system catalog built from it.

pub mod catalog;
pub mod schema;

pub use catalog::{Catalog, CatalogBuilder};
pub use schema::{primary_key_column, Schema, TableDef};
