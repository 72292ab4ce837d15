//! System Catalog for FlatDB
//!
//! This module holds the loaded schema: table definitions and the storage
//! limits shared by every table. The catalog is immutable once built.

use super::schema::{Schema, TableDef};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// System Catalog - read-only view of the database schema
#[derive(Debug)]
pub struct Catalog {
    /// Schema name (data directory name)
    name: String,
    /// Maximum data rows per segment
    segment_row_limit: usize,
    /// Table definitions in declaration order
    tables: IndexMap<String, Arc<TableDef>>,
}

impl Catalog {
    /// Build a catalog from a validated schema
    pub fn from_schema(schema: Schema) -> Result<Self> {
        schema.validate()?;

        let primary_key = schema.primary_key;
        let tables = schema
            .structure
            .into_iter()
            .map(|(name, columns)| {
                let def = Arc::new(TableDef::new(name.clone(), columns, primary_key));
                (name, def)
            })
            .collect();

        Ok(Self {
            name: schema.name,
            segment_row_limit: schema.segment_row_limit,
            tables,
        })
    }

    /// Load the catalog from a JSON schema file
    pub fn load_from_disk(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_schema(Schema::from_json(&json)?)?;
        debug!(
            schema = %catalog.name,
            tables = catalog.tables.len(),
            path = %path.display(),
            "loaded schema"
        );
        Ok(catalog)
    }

    /// Schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum data rows per segment
    pub fn segment_row_limit(&self) -> usize {
        self.segment_row_limit
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Result<Arc<TableDef>> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// List all table names in declaration order
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Iterate over all table definitions
    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableDef>> {
        self.tables.values()
    }

    /// Get table schema info as a formatted string (for .schema command)
    pub fn get_table_info(&self, name: &str) -> Result<String> {
        let table = self.get_table(name)?;
        let mut info = format!("Table: {}\n", table.name());
        info.push_str("Columns:\n");

        if let Some(pk) = table.primary_key_column() {
            info.push_str(&format!("  {} [PRIMARY KEY]\n", pk));
        }
        for col in table.columns() {
            info.push_str(&format!("  {}\n", col));
        }

        Ok(info)
    }
}

/// Builder for creating catalogs with a fluent API
pub struct CatalogBuilder {
    schema: Schema,
}

impl CatalogBuilder {
    /// Start building a new schema
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                segment_row_limit: 1000,
                structure: IndexMap::new(),
                primary_key: false,
            },
        }
    }

    /// Set the per-segment row limit
    pub fn segment_row_limit(mut self, limit: usize) -> Self {
        self.schema.segment_row_limit = limit;
        self
    }

    /// Enable synthetic primary keys
    pub fn primary_key(mut self, enabled: bool) -> Self {
        self.schema.primary_key = enabled;
        self
    }

    /// Add a table
    pub fn table(mut self, name: impl Into<String>, columns: &[&str]) -> Self {
        self.schema.structure.insert(
            name.into(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Build the catalog
    pub fn build(self) -> Result<Catalog> {
        Catalog::from_schema(self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_get_table() {
        let catalog = CatalogBuilder::new("shop")
            .segment_row_limit(10)
            .table("users", &["id", "name"])
            .table("orders", &["id", "total"])
            .build()
            .unwrap();

        assert_eq!(catalog.name(), "shop");
        assert_eq!(catalog.segment_row_limit(), 10);
        assert_eq!(catalog.list_tables(), vec!["users", "orders"]);

        let users = catalog.get_table("users").unwrap();
        assert_eq!(users.name(), "users");
        assert_eq!(users.column_count(), 2);
    }

    #[test]
    fn test_table_not_found() {
        let catalog = CatalogBuilder::new("shop")
            .table("users", &["id"])
            .build()
            .unwrap();

        assert!(!catalog.table_exists("ghosts"));
        let result = catalog.get_table("ghosts");
        assert!(matches!(result, Err(Error::TableNotFound(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"name": "db", "tuples_limit": 3, "structure": {"t": ["a", "b"]}, "primary_key": true}"#,
        )
        .unwrap();

        let catalog = Catalog::load_from_disk(&path).unwrap();
        let table = catalog.get_table("t").unwrap();
        assert!(table.has_primary_key());
        assert_eq!(table.header(), vec!["t_pk", "a", "b"]);

        let info = catalog.get_table_info("t").unwrap();
        assert!(info.contains("t_pk [PRIMARY KEY]"));
    }

    #[test]
    fn test_invalid_schema_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.json");
        std::fs::write(
            &path,
            r#"{"name": "db", "tuples_limit": 3, "structure": {"t": ["a", "a"]}}"#,
        )
        .unwrap();
        assert!(matches!(
            Catalog::load_from_disk(&path),
            Err(Error::InvalidSchema(_))
        ));

        let built = CatalogBuilder::new("db").segment_row_limit(0).table("t", &["a"]).build();
        assert!(matches!(built, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Catalog::load_from_disk(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::IoError(_))));
    }
}
